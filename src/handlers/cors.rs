use actix_web::{
    web, Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{
        Method,
        header::{self, HeaderMap, HeaderValue},
    },
    middleware::Next,
};

use super::AppState;

const ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const ALLOW_METHODS: &str = "GET,POST,OPTIONS";

fn apply_headers(headers: &mut HeaderMap, origin: &str) {
    let origin = HeaderValue::from_str(origin).unwrap_or(HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
}

/// CORS for the static survey site: answers preflight requests directly and
/// stamps the allow headers on every other response, errors included.
pub async fn cors(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let origin = req
        .app_data::<web::Data<AppState>>()
        .map(|s| s.allowed_origin.clone())
        .unwrap_or_else(|| "*".to_string());

    if *req.method() == Method::OPTIONS {
        let mut response = HttpResponse::NoContent().finish();
        apply_headers(response.headers_mut(), &origin);
        return Ok(req.into_response(response).map_into_right_body());
    }

    let mut res = next.call(req).await?;
    apply_headers(res.headers_mut(), &origin);
    Ok(res.map_into_left_body())
}
