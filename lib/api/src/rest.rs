use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use mindx_core::{Edge, Error, ImportError, Node, NodeStyle, Position};
use mindx_storage::MindmapManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::generate::ContentGenerator;

type Manager = web::Data<Arc<MindmapManager>>;
type Generator = web::Data<Arc<dyn ContentGenerator>>;

#[derive(Deserialize)]
struct AddNodeRequest {
    #[serde(default)]
    level: u8,
    label: String,
}

#[derive(Deserialize)]
struct LabelRequest {
    label: String,
}

#[derive(Deserialize)]
struct AddEdgeRequest {
    source: String,
    target: String,
}

#[derive(Deserialize)]
struct SelectionRequest {
    node_id: Option<String>,
}

#[derive(Deserialize)]
struct GenerateRequest {
    topic: String,
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct ImportRequest {
    text: String,
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct SaveRequest {
    name: String,
}

#[derive(Deserialize, Default)]
struct ResaveRequest {
    name: Option<String>,
}

#[derive(Deserialize, Default)]
struct LoadRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct NodeView<'a> {
    #[serde(flatten)]
    node: &'a Node,
    editing: bool,
    style: NodeStyle,
}

#[derive(Serialize)]
struct GraphView<'a> {
    title: Option<String>,
    nodes: Vec<NodeView<'a>>,
    edges: &'a [Edge],
    selected: Option<&'a str>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        manager: Arc<MindmapManager>,
        generator: Arc<dyn ContentGenerator>,
        port: u16,
    ) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(manager.clone()))
                .app_data(web::Data::new(generator.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route. Callers provide `Arc<MindmapManager>` and
/// `Arc<dyn ContentGenerator>` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/graph", web::get().to(get_graph))
        .route("/graph", web::delete().to(clear_graph))
        .route("/graph/nodes", web::post().to(add_node))
        .route("/graph/nodes/{id}", web::delete().to(delete_node))
        .route("/graph/nodes/{id}/label", web::put().to(update_label))
        .route("/graph/nodes/{id}/position", web::put().to(move_node))
        .route("/graph/nodes/{id}/edit", web::post().to(begin_edit))
        .route("/graph/nodes/{id}/edit", web::delete().to(end_edit))
        .route("/graph/edges", web::post().to(add_edge))
        .route("/graph/selection", web::put().to(select_node))
        .route("/graph/generate", web::post().to(generate_graph))
        .route("/graph/import", web::post().to(import_graph))
        .route("/mindmaps", web::get().to(list_mindmaps))
        .route("/mindmaps", web::post().to(save_mindmap))
        .route("/mindmaps/{id}", web::get().to(get_mindmap))
        .route("/mindmaps/{id}", web::put().to(resave_mindmap))
        .route("/mindmaps/{id}", web::delete().to(delete_mindmap))
        .route("/mindmaps/{id}/load", web::post().to(load_mindmap));
}

fn error_response(err: &Error) -> HttpResponse {
    let mut builder = match err {
        Error::Validation(_) => HttpResponse::BadRequest(),
        Error::NotFound(_) => HttpResponse::NotFound(),
        Error::ConfirmationRequired(_) => HttpResponse::Conflict(),
        Error::Import(ImportError::Unauthorized) => HttpResponse::Unauthorized(),
        Error::Import(ImportError::RateLimited) => HttpResponse::TooManyRequests(),
        Error::Import(ImportError::Transport(_)) => HttpResponse::BadGateway(),
        Error::Import(_) => HttpResponse::UnprocessableEntity(),
        Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => {
            warn!("Request failed: {}", err);
            HttpResponse::InternalServerError()
        }
    };
    builder.json(serde_json::json!({
        "error": err.to_string()
    }))
}

fn respond<T: Serialize>(result: mindx_core::Result<T>) -> ActixResult<HttpResponse> {
    Ok(match result {
        Ok(value) => HttpResponse::Ok().json(serde_json::json!({
            "result": value
        })),
        Err(e) => error_response(&e),
    })
}

async fn get_graph(manager: Manager) -> ActixResult<HttpResponse> {
    let graph = manager.graph();
    let view = GraphView {
        title: manager.title(),
        nodes: graph
            .nodes()
            .iter()
            .map(|node| NodeView {
                node,
                editing: node.editing,
                style: node.style(),
            })
            .collect(),
        edges: graph.edges(),
        selected: graph.selected(),
    };
    Ok(HttpResponse::Ok().json(view))
}

async fn clear_graph(manager: Manager) -> ActixResult<HttpResponse> {
    manager.clear();
    respond(Ok(true))
}

async fn add_node(manager: Manager, req: web::Json<AddNodeRequest>) -> ActixResult<HttpResponse> {
    let result = manager.with_graph_mut(|graph| {
        let anchor = graph.selected().map(str::to_string);
        graph.add_node(req.level, &req.label, anchor.as_deref())
    });
    respond(result.map(|id| serde_json::json!({ "id": id })))
}

async fn delete_node(manager: Manager, path: web::Path<String>) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    respond(Ok(manager.with_graph_mut(|graph| graph.delete_node(&id))))
}

async fn update_label(
    manager: Manager,
    path: web::Path<String>,
    req: web::Json<LabelRequest>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    respond(manager.with_graph_mut(|graph| graph.update_label(&id, &req.label)).map(|_| true))
}

async fn move_node(
    manager: Manager,
    path: web::Path<String>,
    req: web::Json<Position>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let position = req.into_inner();
    respond(manager.with_graph_mut(|graph| graph.move_node(&id, position)).map(|_| true))
}

async fn begin_edit(manager: Manager, path: web::Path<String>) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    respond(manager.with_graph_mut(|graph| graph.begin_edit(&id)).map(|_| true))
}

async fn end_edit(manager: Manager, path: web::Path<String>) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    respond(manager.with_graph_mut(|graph| graph.end_edit(&id)).map(|_| true))
}

async fn add_edge(manager: Manager, req: web::Json<AddEdgeRequest>) -> ActixResult<HttpResponse> {
    let result = manager.with_graph_mut(|graph| graph.add_edge(&req.source, &req.target));
    respond(result.map(|id| serde_json::json!({ "id": id })))
}

async fn select_node(manager: Manager, req: web::Json<SelectionRequest>) -> ActixResult<HttpResponse> {
    respond(manager.with_graph_mut(|graph| graph.select(req.node_id.as_deref())).map(|_| true))
}

async fn generate_graph(
    manager: Manager,
    generator: Generator,
    req: web::Json<GenerateRequest>,
) -> ActixResult<HttpResponse> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Ok(error_response(&Error::validation("topic must not be empty")));
    }
    // Ask before spending a generator call on a map that would be refused.
    if let Err(e) = manager.ensure_replace_allowed(req.confirm) {
        return Ok(error_response(&e));
    }
    let raw = match generator.generate(topic).await {
        Ok(raw) => raw,
        Err(e) => return Ok(error_response(&e)),
    };
    // The replace was approved above; edits racing the request are overwritten.
    respond(manager.import_text(&raw, Some(topic), true))
}

async fn import_graph(manager: Manager, req: web::Json<ImportRequest>) -> ActixResult<HttpResponse> {
    respond(manager.import_text(&req.text, None, req.confirm))
}

async fn list_mindmaps(manager: Manager) -> ActixResult<HttpResponse> {
    respond(manager.list())
}

async fn save_mindmap(manager: Manager, req: web::Json<SaveRequest>) -> ActixResult<HttpResponse> {
    respond(manager.save_current(&req.name).map(|s| s.summary()))
}

async fn get_mindmap(manager: Manager, path: web::Path<String>) -> ActixResult<HttpResponse> {
    respond(manager.snapshots().load(&path.into_inner()))
}

async fn resave_mindmap(
    manager: Manager,
    path: web::Path<String>,
    req: Option<web::Json<ResaveRequest>>,
) -> ActixResult<HttpResponse> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    respond(manager.resave(&path.into_inner(), req.name.as_deref()).map(|s| s.summary()))
}

async fn delete_mindmap(manager: Manager, path: web::Path<String>) -> ActixResult<HttpResponse> {
    respond(manager.delete_snapshot(&path.into_inner()))
}

async fn load_mindmap(
    manager: Manager,
    path: web::Path<String>,
    req: Option<web::Json<LoadRequest>>,
) -> ActixResult<HttpResponse> {
    let confirm = req.map(|r| r.confirm).unwrap_or(false);
    respond(manager.load(&path.into_inner(), confirm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use futures_util::future::BoxFuture;
    use mindx_core::SequentialGenerator;
    use mindx_storage::MemoryBackend;

    const GENERATED: &str = r#"Here you go:
```json
{"title": "Photosynthesis", "nodes": [
  {"id": "1", "text": "Photosynthesis", "parentId": null, "level": 0},
  {"id": "2", "text": "Light Reactions", "parentId": "1", "level": 1},
  {"id": "3", "text": "Calvin Cycle", "parentId": "1", "level": 1}
]}
```"#;

    struct CannedGenerator(mindx_core::Result<String>);

    impl ContentGenerator for CannedGenerator {
        fn generate<'a>(&'a self, _topic: &'a str) -> BoxFuture<'a, mindx_core::Result<String>> {
            let reply = match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(Error::Import(e)) => Err(Error::Import(e.clone())),
                Err(e) => Err(Error::Storage(e.to_string())),
            };
            Box::pin(async move { reply })
        }
    }

    fn state(reply: mindx_core::Result<String>) -> (Arc<MindmapManager>, Arc<dyn ContentGenerator>) {
        let manager = Arc::new(MindmapManager::with_id_generator(
            Arc::new(MemoryBackend::new()),
            Arc::new(SequentialGenerator::default()),
        ));
        let generator: Arc<dyn ContentGenerator> = Arc::new(CannedGenerator(reply));
        (manager, generator)
    }

    macro_rules! app {
        ($manager:expr, $generator:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($manager.clone()))
                    .app_data(web::Data::new($generator.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_add_and_fetch_graph() {
        let (manager, generator) = state(Ok(GENERATED.to_string()));
        let app = app!(manager, generator);

        let req = test::TestRequest::post()
            .uri("/graph/nodes")
            .set_json(serde_json::json!({"level": 0, "label": "Motion"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/graph").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["nodes"][0]["label"], "Motion");
        assert_eq!(body["nodes"][0]["style"]["background"], "#2563eb");
        assert_eq!(body["edges"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_validation_maps_to_bad_request() {
        let (manager, generator) = state(Ok(GENERATED.to_string()));
        let app = app!(manager, generator);

        let req = test::TestRequest::post()
            .uri("/graph/nodes")
            .set_json(serde_json::json!({"level": 0, "label": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    }

    #[actix_web::test]
    async fn test_delete_absent_is_noop() {
        let (manager, generator) = state(Ok(GENERATED.to_string()));
        let app = app!(manager, generator);

        for uri in ["/graph/nodes/ghost", "/mindmaps/ghost"] {
            let req = test::TestRequest::delete().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["result"], false);
        }
    }

    #[actix_web::test]
    async fn test_generate_then_confirm() {
        let (manager, generator) = state(Ok(GENERATED.to_string()));
        let app = app!(manager, generator);

        let req = test::TestRequest::post()
            .uri("/graph/generate")
            .set_json(serde_json::json!({"topic": "Photosynthesis"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["result"]["node_count"], 3);
        assert_eq!(body["result"]["edge_count"], 2);
        assert_eq!(body["result"]["title"], "Photosynthesis");
        assert_eq!(manager.graph().node_count(), 3);
        assert_eq!(manager.title().as_deref(), Some("Photosynthesis"));

        let req = test::TestRequest::post()
            .uri("/graph/generate")
            .set_json(serde_json::json!({"topic": "Photosynthesis"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    /// Adds a node to the live graph while the request is outstanding.
    struct EditDuringRequest {
        manager: Arc<MindmapManager>,
    }

    impl ContentGenerator for EditDuringRequest {
        fn generate<'a>(&'a self, _topic: &'a str) -> BoxFuture<'a, mindx_core::Result<String>> {
            Box::pin(async move {
                let edit = self.manager.with_graph_mut(|g| g.add_node(0, "Typed meanwhile", None));
                edit.map(|_| GENERATED.to_string())
            })
        }
    }

    #[actix_web::test]
    async fn test_generate_overwrites_edits_made_in_flight() {
        let (manager, _) = state(Ok(String::new()));
        let generator: Arc<dyn ContentGenerator> = Arc::new(EditDuringRequest { manager: manager.clone() });
        let app = app!(manager, generator);

        let req = test::TestRequest::post()
            .uri("/graph/generate")
            .set_json(serde_json::json!({"topic": "Photosynthesis"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let graph = manager.graph();
        assert_eq!(graph.node_count(), 3);
        assert!(graph.nodes().iter().all(|n| n.label != "Typed meanwhile"));
    }

    #[actix_web::test]
    async fn test_generator_errors_map_to_status() {
        let (manager, generator) = state(Err(ImportError::RateLimited.into()));
        let app = app!(manager, generator);
        let req = test::TestRequest::post()
            .uri("/graph/generate")
            .set_json(serde_json::json!({"topic": "Waves"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(manager.graph().is_empty());

        let (manager, generator) = state(Ok("nothing useful".to_string()));
        let app = app!(manager, generator);
        let req = test::TestRequest::post()
            .uri("/graph/generate")
            .set_json(serde_json::json!({"topic": "Waves"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_save_list_load() {
        let (manager, generator) = state(Ok(GENERATED.to_string()));
        let app = app!(manager, generator);

        let req = test::TestRequest::post()
            .uri("/graph/import")
            .set_json(serde_json::json!({"text": GENERATED}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["result"]["title"], "Photosynthesis");
        assert_eq!(body["result"]["node_count"], 3);
        assert_eq!(body["result"]["edge_count"], 2);

        let req = test::TestRequest::post()
            .uri("/mindmaps")
            .set_json(serde_json::json!({"name": "Bio"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = body["result"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get().uri("/mindmaps").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"][0]["node_count"], 3);

        let req = test::TestRequest::delete().uri("/graph").to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri(&format!("/mindmaps/{}/load", id))
            .set_json(serde_json::json!({"confirm": false}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["result"]["title"], "Photosynthesis");
        assert_eq!(body["result"]["node_count"], 3);
        assert_eq!(body["result"]["edge_count"], 2);
        assert_eq!(manager.graph().node_count(), 3);

        let req = test::TestRequest::delete().uri(&format!("/mindmaps/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::get().uri(&format!("/mindmaps/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
