use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, Response};
use wecomment_core::api::{ApiRequest, ApiResponse};

fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Run one backend request through `fetch`. Any non-HTTP failure comes back
/// as `Err` with a printable reason.
pub async fn execute(request: &ApiRequest) -> Result<ApiResponse, String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;

    let headers = Headers::new().map_err(js_error)?;
    for (name, value) in request.headers() {
        headers.set(name, &value).map_err(js_error)?;
    }
    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    init.set_headers(&headers);
    if let Some(body) = request.body_text() {
        init.set_body(&JsValue::from_str(&body));
    }

    let resp = JsFuture::from(window.fetch_with_str_and_init(&request.url, &init))
        .await
        .map_err(js_error)?;
    let resp: Response = resp.dyn_into().map_err(js_error)?;
    let status = resp.status();
    let text = JsFuture::from(resp.text().map_err(js_error)?).await.map_err(js_error)?;
    Ok(ApiResponse::new(status, text.as_string().unwrap_or_default()))
}
