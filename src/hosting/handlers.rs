use super::*;
use crate::clustering::KMeans;
use crate::clustering::Model;
use crate::database::NewUpload;
use crate::geo::Format;
use crate::geo::Point;
use crate::media::sanitize;
use actix_multipart::Multipart;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use askama::Template;
use futures::StreamExt;

pub const INDEX: &str = "/ml/";

fn fail(e: impl std::fmt::Display) -> HttpResponse {
    log::error!("{}", e);
    HttpResponse::InternalServerError().body(e.to_string())
}

fn page(template: &impl Template, clear: bool) -> HttpResponse {
    match template.render() {
        Ok(body) => {
            let mut response = HttpResponse::Ok();
            response.content_type("text/html; charset=utf-8");
            if clear {
                response.cookie(Flash::removal());
            }
            response.body(body)
        }
        Err(e) => fail(e),
    }
}

pub async fn index(hub: web::Data<Hub>, req: HttpRequest) -> HttpResponse {
    let flash = Flash::from_request(&req);
    match hub.store().uploads().await {
        Ok(uploads) => page(&Index { flash, uploads }, flash.is_some()),
        Err(e) => fail(e),
    }
}

pub async fn uploader(hub: web::Data<Hub>) -> HttpResponse {
    page(&Uploader::new(hub.limit(), None), false)
}

pub async fn upload(hub: web::Data<Hub>, payload: Multipart) -> HttpResponse {
    let (name, bytes) = match receive(payload, hub.limit()).await {
        Ok(file) => file,
        Err(error) => {
            log::warn!("rejected upload: {}", error);
            return page(&Uploader::new(hub.limit(), Some(error)), false);
        }
    };
    let path = match hub.media().store(&name, &bytes) {
        Ok(path) => path,
        Err(e) => return fail(e),
    };
    let record = NewUpload {
        name,
        path: path.clone(),
        size: bytes.len() as i64,
    };
    match hub.store().create(record).await {
        Ok(upload) => {
            log::info!("upload {} recorded as {}", upload.id, upload.path);
            redirect(INDEX, Some(Flash::Uploaded))
        }
        Err(e) => {
            let _ = hub.media().remove(&path);
            fail(e)
        }
    }
}

/// Pulls the `file` field out of a multipart body. Errors are messages for
/// the re-rendered form.
async fn receive(mut payload: Multipart, limit: usize) -> Result<(String, Vec<u8>), String> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| e.to_string())?;
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| String::from("no file selected"))?;
        // the stored name is what training dispatches on
        Format::try_from(sanitize(&name).as_str()).map_err(|_| {
            format!(
                "unsupported file type, expected one of: {}",
                Format::extensions().join(", ")
            )
        })?;
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            if bytes.len() + chunk.len() > limit {
                return Err(format!("file exceeds the limit of {} bytes", limit));
            }
            bytes.extend_from_slice(&chunk);
        }
        return match bytes.is_empty() {
            true => Err(String::from("the submitted file is empty")),
            false => Ok((name, bytes)),
        };
    }
    Err(String::from("no file selected"))
}

pub async fn configure(hub: web::Data<Hub>, body: web::Bytes) -> HttpResponse {
    let selection = Selection::from(&body[..]);
    if selection.pks.is_empty() {
        return redirect(INDEX, None);
    }
    match hub.store().select(&selection.pks).await {
        Ok(uploads) if uploads.is_empty() => redirect(INDEX, None),
        Ok(uploads) => page(
            &Configure {
                uploads: selection.order(uploads),
                n_clusters: crate::KMEANS_DEFAULT_CLUSTERS,
                max: crate::KMEANS_MAX_CLUSTERS,
            },
            false,
        ),
        Err(e) => fail(e),
    }
}

pub async fn delete(hub: web::Data<Hub>, body: web::Bytes) -> HttpResponse {
    let selection = Selection::from(&body[..]);
    if selection.pks.is_empty() {
        return redirect(INDEX, None);
    }
    match hub.store().delete(&selection.pks).await {
        Ok(gone) if gone.is_empty() => redirect(INDEX, None),
        Ok(gone) => {
            for upload in gone.iter() {
                if let Err(e) = hub.media().remove(&upload.path) {
                    log::warn!("could not remove {}: {}", upload.path, e);
                }
            }
            log::info!("deleted {} uploads", gone.len());
            redirect(INDEX, Some(Flash::Deleted))
        }
        Err(e) => fail(e),
    }
}

pub async fn train(hub: web::Data<Hub>, body: web::Bytes) -> HttpResponse {
    let selection = Selection::from(&body[..]);
    let Some(k) = selection.n_clusters else {
        return redirect(INDEX, None);
    };
    if selection.pks.is_empty() {
        return redirect(INDEX, None);
    }
    let uploads = match hub.store().select(&selection.pks).await {
        Ok(uploads) if uploads.is_empty() => return redirect(INDEX, None),
        Ok(uploads) => selection.order(uploads),
        Err(e) => return fail(e),
    };
    let Some(trainer) = hub.trainer() else {
        log::warn!("training already in progress");
        return redirect(INDEX, Some(Flash::TrainingBusy));
    };
    let paths = match uploads
        .iter()
        .map(|u| hub.media().resolve(&u.path))
        .collect::<crate::Result<Vec<_>>>()
    {
        Ok(paths) => paths,
        Err(e) => {
            log::warn!("training failed: {}", e);
            return redirect(INDEX, Some(Flash::TrainingFailed));
        }
    };
    match Training::new(&hub, paths, KMeans::from(k), trainer).spawn().await {
        Ok(Ok(Outcome::Trained)) => redirect(INDEX, Some(Flash::Trained)),
        Ok(Ok(Outcome::Rejected(e))) => {
            log::warn!("training failed: {}", e);
            redirect(INDEX, Some(Flash::TrainingFailed))
        }
        Ok(Err(e)) => fail(e),
        Err(e) => fail(e),
    }
}

pub async fn api(hub: web::Data<Hub>, query: web::Query<Lookup>) -> HttpResponse {
    let Some(coordinates) = query.coordinates() else {
        return redirect(INDEX, None);
    };
    let point = match Point::try_from(coordinates) {
        Ok(point) => point,
        Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
    };
    let path = hub.media().kmeans();
    let model = match web::block(move || Model::load(&path)).await {
        Ok(Ok(model)) => model,
        Ok(Err(e)) if e.is_missing() => return HttpResponse::NotFound().body("model not found"),
        Ok(Err(e)) => return fail(e),
        Err(e) => return fail(e),
    };
    let cluster = model.predict(&point);
    match hub.store().cluster(cluster).await {
        Ok(Some(data)) => HttpResponse::Ok().json(data),
        Ok(None) => {
            log::warn!("no stored summary for cluster {}", cluster);
            redirect(INDEX, Some(Flash::ClusterMissing))
        }
        Err(e) => fail(e),
    }
}

pub async fn view(hub: web::Data<Hub>) -> HttpResponse {
    let path = hub.media().map();
    match web::block(move || std::fs::read_to_string(path)).await {
        Ok(Ok(map)) => page(&View { map }, false),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            redirect(INDEX, Some(Flash::MapMissing))
        }
        Ok(Err(e)) => fail(e),
        Err(e) => fail(e),
    }
}

pub async fn health(hub: web::Data<Hub>) -> HttpResponse {
    match hub.store().ping().await {
        Ok(()) => HttpResponse::Ok().body("ok"),
        Err(e) => {
            log::error!("health check failed: {}", e);
            HttpResponse::ServiceUnavailable().body(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Memory;
    use crate::database::Store;
    use crate::hotspot::Summary;
    use crate::media::Media;
    use actix_web::App;
    use actix_web::http::StatusCode;
    use actix_web::http::header;
    use actix_web::test;
    use std::sync::Arc;

    const BOUNDARY: &str = "hotspotsboundary";
    const BLOBS: &str = "lat,lon\n10,10\n10.01,10\n10,10.01\n-20,30\n-20.01,30\n-20,30.01\n";

    fn hub(limit: usize) -> (tempfile::TempDir, web::Data<Hub>) {
        let dir = tempfile::tempdir().unwrap();
        let media = Media::new(dir.path().join("media")).unwrap();
        let hub = Hub::new(Arc::new(Memory::default()), media, limit);
        (dir, web::Data::new(hub))
    }

    fn multipart(filename: &str, contents: &str) -> test::TestRequest {
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {c}\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
            f = filename,
            c = contents,
        );
        test::TestRequest::post()
            .uri("/ml/upload")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    fn form(uri: &str, body: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload(body.to_string())
    }

    async fn seed(hub: &Hub, name: &str, contents: &str) -> i64 {
        let path = hub.media().store(name, contents.as_bytes()).unwrap();
        let record = NewUpload {
            name: name.to_string(),
            path,
            size: contents.len() as i64,
        };
        hub.store().create(record).await.unwrap().id
    }

    fn flash(response: &actix_web::dev::ServiceResponse) -> Option<String> {
        response
            .response()
            .cookies()
            .find(|c| c.name() == "flash")
            .map(|c| c.value().to_string())
    }

    fn location(response: &actix_web::dev::ServiceResponse) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[actix_web::test]
    async fn upload_creates_record_and_file() {
        let (_dir, hub) = hub(1 << 20);
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let response = test::call_service(&app, multipart("points.csv", BLOBS).to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), INDEX);
        assert_eq!(flash(&response).as_deref(), Some("uploaded"));
        let uploads = hub.store().uploads().await.unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].name, "points.csv");
        assert_eq!(uploads[0].size, BLOBS.len() as i64);
        let stored = hub.media().resolve(&uploads[0].path).unwrap();
        assert_eq!(std::fs::read_to_string(stored).unwrap(), BLOBS);
    }

    #[actix_web::test]
    async fn upload_rerenders_invalid_forms() {
        let (_dir, hub) = hub(32);
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        for (name, contents, error) in [
            ("points.exe", "lat,lon\n1,1\n", "unsupported file type"),
            ("points.csv/", "lat,lon\n1,1\n", "unsupported file type"),
            ("x\\\\.csv", "lat,lon\n1,1\n", "unsupported file type"),
            ("points.csv", "", "empty"),
            ("points.csv", BLOBS, "exceeds the limit"),
        ] {
            let response = test::call_service(&app, multipart(name, contents).to_request()).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = test::read_body(response).await;
            let body = String::from_utf8_lossy(&body);
            assert!(body.contains(error), "{} missing from page", error);
        }
        assert!(hub.store().uploads().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn delete_removes_record_and_file() {
        let (_dir, hub) = hub(1 << 20);
        let keep = seed(&hub, "keep.csv", BLOBS).await;
        let drop = seed(&hub, "drop.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let response = test::call_service(&app, form("/ml/delete", &format!("pk={}", drop)).to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(flash(&response).as_deref(), Some("deleted"));
        let uploads = hub.store().uploads().await.unwrap();
        assert_eq!(uploads.iter().map(|u| u.id).collect::<Vec<_>>(), vec![keep]);
        let files = std::fs::read_dir(hub.media().root().join(crate::UPLOADS_DIR))
            .unwrap()
            .count();
        assert_eq!(files, 1);
    }

    #[actix_web::test]
    async fn configure_needs_known_files() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let response = test::call_service(&app, form("/ml/configure", "").to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let response = test::call_service(&app, form("/ml/configure", "pk=999").to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let response = test::call_service(&app, form("/ml/configure", &format!("pk={}", id)).to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("points.csv"));
        assert!(body.contains(r#"name="n_clusters" value="8""#));
    }

    #[actix_web::test]
    async fn configure_lists_files_in_submitted_order() {
        let (_dir, hub) = hub(1 << 20);
        let first = seed(&hub, "first.csv", BLOBS).await;
        let second = seed(&hub, "second.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let body = format!("pk={}&pk={}", second, first);
        let response = test::call_service(&app, form("/ml/configure", &body).to_request()).await;
        let body = test::read_body(response).await;
        let body = String::from_utf8_lossy(&body);
        let (a, b) = (body.find("first.csv").unwrap(), body.find("second.csv").unwrap());
        assert!(b < a);
        assert!(body.contains(&format!(r#"max="{}""#, crate::KMEANS_MAX_CLUSTERS)));
    }

    #[actix_web::test]
    async fn api_without_model_is_not_found() {
        let (_dir, hub) = hub(1 << 20);
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let request = test::TestRequest::get().uri("/ml/api?latitude=1&longitude=2");
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn api_validates_parameters() {
        let (_dir, hub) = hub(1 << 20);
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let request = test::TestRequest::get().uri("/ml/api?latitude=1");
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), INDEX);
        let request = test::TestRequest::get().uri("/ml/api?latitude=north&longitude=2");
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let request = test::TestRequest::get().uri("/ml/api?latitude=91&longitude=2");
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn api_flashes_missing_clusters() {
        let (_dir, hub) = hub(1 << 20);
        Model::new(vec![Point::new(0., 0.)], 0., 1)
            .save(&hub.media().kmeans())
            .unwrap();
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let request = test::TestRequest::get().uri("/ml/api?latitude=1&longitude=2");
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(flash(&response).as_deref(), Some("cluster-missing"));
    }

    #[actix_web::test]
    async fn train_then_lookup() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let body = format!("pk={}&n_clusters=2", id);
        let response = test::call_service(&app, form("/ml/train", &body).to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(flash(&response).as_deref(), Some("trained"));
        assert!(hub.media().kmeans().exists());
        assert!(hub.media().map().exists());
        assert_eq!(hub.store().clusters().await.unwrap().len(), 2);

        let model = Model::load(&hub.media().kmeans()).unwrap();
        let expected = model.predict(&Point::new(-20., 30.));
        let request = test::TestRequest::get().uri("/ml/api?latitude=-20.002&longitude=30.004");
        let summary: Summary = test::call_and_read_body_json(&app, request.to_request()).await;
        assert_eq!(summary.cluster, expected);
        assert_eq!(summary.population, 3);

        let request = test::TestRequest::get().uri("/ml/view");
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        assert!(String::from_utf8_lossy(&body).contains("<iframe"));
    }

    #[actix_web::test]
    async fn training_replaces_previous_clusters() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let body = format!("pk={}&n_clusters=3", id);
        test::call_service(&app, form("/ml/train", &body).to_request()).await;
        assert_eq!(hub.store().clusters().await.unwrap().len(), 3);
        let body = format!("pk={}&n_clusters=2", id);
        test::call_service(&app, form("/ml/train", &body).to_request()).await;
        assert_eq!(hub.store().clusters().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn training_failures_are_flashed() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", "lat,lon\n1,1\n2,2\n").await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let body = format!("pk={}&n_clusters=5", id);
        let response = test::call_service(&app, form("/ml/train", &body).to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(flash(&response).as_deref(), Some("training-failed"));
        assert!(!hub.media().kmeans().exists());
        assert!(hub.store().clusters().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn train_ignores_incomplete_forms() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        for body in [
            format!("pk={}", id),
            format!("pk={}&n_clusters=0", id),
            format!("pk={}&n_clusters={}", id, crate::KMEANS_MAX_CLUSTERS + 1),
            String::from("n_clusters=2"),
        ] {
            let response = test::call_service(&app, form("/ml/train", &body).to_request()).await;
            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(flash(&response), None);
        }
        assert!(!hub.media().kmeans().exists());
    }

    #[actix_web::test]
    async fn busy_trainer_is_flashed() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let held = hub.trainer().unwrap();
        let body = format!("pk={}&n_clusters=2", id);
        let response = test::call_service(&app, form("/ml/train", &body).to_request()).await;
        assert_eq!(flash(&response).as_deref(), Some("training-busy"));
        drop(held);
    }

    #[actix_web::test]
    async fn abandoned_training_keeps_the_trainer_until_written() {
        let (_dir, hub) = hub(1 << 20);
        let id = seed(&hub, "points.csv", BLOBS).await;
        let paths = hub
            .store()
            .select(&[id])
            .await
            .unwrap()
            .iter()
            .map(|u| hub.media().resolve(&u.path).unwrap())
            .collect();
        let trainer = hub.trainer().unwrap();
        // nobody awaits the run, as when the client disconnects mid-request
        drop(Training::new(&hub, paths, KMeans::from(2), trainer).spawn());
        assert!(hub.trainer().is_none());
        while hub.trainer().is_none() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(hub.media().kmeans().exists());
        assert!(hub.media().map().exists());
        assert_eq!(hub.store().clusters().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn view_without_map_redirects() {
        let (_dir, hub) = hub(1 << 20);
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let response = test::call_service(&app, test::TestRequest::get().uri("/ml/view").to_request()).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(flash(&response).as_deref(), Some("map-missing"));
    }

    #[actix_web::test]
    async fn index_shows_and_clears_flash() {
        let (_dir, hub) = hub(1 << 20);
        seed(&hub, "points.csv", BLOBS).await;
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let request = test::TestRequest::get()
            .uri("/ml/")
            .cookie(Flash::Uploaded.cookie());
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(flash(&response).as_deref(), Some(""));
        let body = test::read_body(response).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains(Flash::Uploaded.message()));
        assert!(body.contains("points.csv"));
    }

    #[actix_web::test]
    async fn health_answers() {
        let (_dir, hub) = hub(1 << 20);
        let app = test::init_service(App::new().app_data(hub.clone()).configure(routes)).await;
        let response = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
