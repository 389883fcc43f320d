use std::path::Path;
use std::sync::Arc;

use actix_files as fs;
use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};

use crate::overlays::{MemoryOverlayStore, OverlayStore, OverlayUrls, SqliteOverlayStore};
use crate::shell::assets::ResourceManifest;
use crate::shell::{AppConfig, ClientConfig, PageAssembler, ShellResult, TemplateRegistry};
use crate::web::handlers;

/// Shared application state for web handlers
pub struct AppState {
    pub assembler: PageAssembler,
    pub client: ClientConfig,
    pub templates: TemplateRegistry,
    pub store: Arc<dyn OverlayStore>,
    pub urls: OverlayUrls,
    pub public_by_default: bool,
}

impl AppState {
    /// Build the state once at start-up; everything but the store is
    /// read-only afterwards.
    pub fn from_config(config: &AppConfig) -> ShellResult<Self> {
        let client = config.client_config()?;

        let templates = match &config.client_templates_dir {
            Some(dir) if Path::new(dir).is_dir() => TemplateRegistry::load_dir(dir)?,
            Some(dir) => {
                warn!("Client template directory {} not found, serving no templates", dir);
                TemplateRegistry::new()
            }
            None => TemplateRegistry::new(),
        };

        let store: Arc<dyn OverlayStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteOverlayStore::open(path)?),
            None => {
                info!("No database configured, overlays are kept in memory");
                Arc::new(MemoryOverlayStore::new())
            }
        };

        Ok(Self::new(config, client, templates, store))
    }

    pub fn new(
        config: &AppConfig,
        client: ClientConfig,
        templates: TemplateRegistry,
        store: Arc<dyn OverlayStore>,
    ) -> Self {
        Self {
            assembler: PageAssembler::new(
                config.title.clone(),
                ResourceManifest::for_static_url(&config.static_url),
            ),
            client,
            templates,
            store,
            urls: OverlayUrls {
                overlay_json: "/api/overlay".to_string(),
                tiles: config.tiles_url.clone(),
                public_tiles: config.public_tiles_url.clone(),
                export: config.export_url.clone(),
            },
            public_by_default: config.public_by_default,
        }
    }
}

/// Page and API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/overlays", web::get().to(handlers::overlays::list_overlays))
            .route("/overlays", web::post().to(handlers::overlays::create_overlay))
            .route("/overlay/{key}", web::get().to(handlers::overlays::get_overlay))
            .route("/overlay/{key}", web::put().to(handlers::overlays::update_overlay))
            .route("/overlay/{key}", web::delete().to(handlers::overlays::delete_overlay)),
    )
    // Page routes
    .route("/", web::get().to(handlers::pages::overlays))
    .route("/overlays/", web::get().to(handlers::pages::overlays))
    .route("/overlay/new", web::get().to(handlers::pages::new_overlay));
}

/// Start the web server for the tie-point client
pub async fn start_web_server(config: &AppConfig, state: AppState) -> std::io::Result<()> {
    info!("Starting web server on http://{}", config.bind_address);

    let app_state = web::Data::new(state);
    let static_url = config.static_url.clone();
    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            // Static files
            .service(fs::Files::new(&static_url, &static_dir))
            .configure(configure)
            // Default route for 404
            .default_service(web::to(handlers::pages::not_found))
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
