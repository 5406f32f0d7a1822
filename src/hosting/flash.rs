use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::cookie::Cookie;
use actix_web::http::header;

const COOKIE: &str = "flash";

/// One-shot notices carried across a redirect in a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Uploaded,
    Deleted,
    Trained,
    TrainingFailed,
    TrainingBusy,
    ClusterMissing,
    MapMissing,
}

impl Flash {
    const ALL: [Self; 7] = [
        Self::Uploaded,
        Self::Deleted,
        Self::Trained,
        Self::TrainingFailed,
        Self::TrainingBusy,
        Self::ClusterMissing,
        Self::MapMissing,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Deleted => "deleted",
            Self::Trained => "trained",
            Self::TrainingFailed => "training-failed",
            Self::TrainingBusy => "training-busy",
            Self::ClusterMissing => "cluster-missing",
            Self::MapMissing => "map-missing",
        }
    }
    /// CSS class of the rendered notice.
    pub fn level(&self) -> &'static str {
        match self {
            Self::Uploaded | Self::Deleted | Self::Trained => "success",
            Self::TrainingBusy | Self::ClusterMissing | Self::MapMissing => "warning",
            Self::TrainingFailed => "error",
        }
    }
    pub fn message(&self) -> &'static str {
        match self {
            Self::Uploaded => "File uploaded successfully",
            Self::Deleted => "Selected files deleted",
            Self::Trained => "Training finished successfully",
            Self::TrainingFailed => "Training failed, check the selected files",
            Self::TrainingBusy => "Another training run is in progress, try again shortly",
            Self::ClusterMissing => "cluster not found",
            Self::MapMissing => "map not found",
        }
    }

    pub fn from_request(req: &HttpRequest) -> Option<Self> {
        req.cookie(COOKIE)
            .and_then(|c| Self::try_from(c.value()).ok())
    }

    pub fn cookie(self) -> Cookie<'static> {
        Cookie::build(COOKIE, self.code())
            .path("/")
            .http_only(true)
            .finish()
    }

    /// Expired cookie that clears a shown notice.
    pub fn removal() -> Cookie<'static> {
        let mut cookie = Cookie::build(COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }
}

impl TryFrom<&str> for Flash {
    type Error = String;
    fn try_from(code: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|f| f.code() == code)
            .ok_or_else(|| format!("unknown flash code {}", code))
    }
}

/// 302 to `location`, optionally leaving a notice for the next page.
pub fn redirect(location: &str, flash: Option<Flash>) -> HttpResponse {
    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, location));
    if let Some(flash) = flash {
        response.cookie(flash.cookie());
    }
    response.finish()
}
