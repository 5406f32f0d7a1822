use super::*;
use crate::Result;
use crate::media::Media;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;

pub struct Server;

impl Server {
    pub async fn run(settings: Settings) -> Result<()> {
        let media = Media::new(settings.media_root.clone())?;
        let store = settings.store().await?;
        let hub = web::Data::new(Hub::new(store, media, settings.upload_limit));
        log::info!("starting hosting server on {}", settings.bind);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(hub.clone())
                .configure(routes)
        })
        .workers(settings.workers)
        .bind(settings.bind.as_str())?
        .run()
        .await?;
        Ok(())
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/ml")
            .route("", web::get().to(index))
            .route("/", web::get().to(index))
            .route("/upload", web::get().to(uploader))
            .route("/upload", web::post().to(upload))
            .route("/configure", web::post().to(configure))
            .route("/delete", web::post().to(delete))
            .route("/train", web::post().to(train))
            .route("/api", web::get().to(api))
            .route("/view", web::get().to(view)),
    );
}
