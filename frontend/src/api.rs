//! Thin fetch wrappers over the four task endpoints.

use shared::{CreateTaskRequest, Task, UpdateTaskRequest};
use uuid::Uuid;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

const API_URL: &str = "/api/tasks";

async fn send(method: &str, url: &str, body: Option<&str>) -> Result<Response, String> {
    let opts = RequestInit::new();
    opts.set_method(method);
    if let Some(body) = body {
        opts.set_body(&wasm_bindgen::JsValue::from_str(body));
    }

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|_| "Failed to create request".to_string())?;

    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|_| "Failed to set header".to_string())?;
    }

    let window = web_sys::window().ok_or_else(|| "No window".to_string())?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|_| "Failed to send request".to_string())?
        .into();

    if !response.ok() {
        return Err(format!("Request failed with status {}", response.status()));
    }

    Ok(response)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, String> {
    let text_promise = response
        .text()
        .map_err(|_| "Failed to read response".to_string())?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| "Failed to get text".to_string())?
        .as_string()
        .ok_or_else(|| "Failed to convert to string".to_string())?;

    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON: {}", e))
}

pub async fn fetch_tasks() -> Result<Vec<Task>, String> {
    let response = send("GET", API_URL, None).await?;
    read_json(response).await
}

pub async fn create_task(request: &CreateTaskRequest) -> Result<Task, String> {
    let body =
        serde_json::to_string(request).map_err(|_| "Failed to serialize request".to_string())?;
    let response = send("POST", API_URL, Some(&body)).await?;
    read_json(response).await
}

pub async fn update_task(id: Uuid, request: &UpdateTaskRequest) -> Result<Task, String> {
    let body =
        serde_json::to_string(request).map_err(|_| "Failed to serialize request".to_string())?;
    let response = send("PUT", &format!("{}/{}", API_URL, id), Some(&body)).await?;
    read_json(response).await
}

pub async fn delete_task(id: Uuid) -> Result<(), String> {
    send("DELETE", &format!("{}/{}", API_URL, id), None).await?;
    Ok(())
}
