//! Form definitions and the data submitted against them.

use serde_json::Value;

use crate::gateway::{Gateway, GatewayError, RequestDescriptor};

async fn value(gateway: &Gateway, request: RequestDescriptor) -> Result<Value, GatewayError> {
    gateway.send(request).await?.into_json()
}

// --- definitions ---

pub async fn create_definition(gateway: &Gateway, form: &Value) -> Result<Value, GatewayError> {
    value(gateway, RequestDescriptor::post("/api/form-definition").json(form.clone())).await
}

pub async fn update_definition(gateway: &Gateway, id: i64, form: &Value) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::put(format!("/api/form-definition/{id}")).json(form.clone()),
    )
    .await
}

pub async fn publish_definition(gateway: &Gateway, id: i64) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::post(format!("/api/form-definition/{id}/publish")),
    )
    .await
}

pub async fn new_version(gateway: &Gateway, form_key: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::post(format!("/api/form-definition/{form_key}/new-version")),
    )
    .await
}

pub async fn delete_definition(gateway: &Gateway, id: i64) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::delete(format!("/api/form-definition/{id}")))
        .await
        .map(drop)
}

pub async fn get_definition(gateway: &Gateway, id: i64) -> Result<Value, GatewayError> {
    value(gateway, RequestDescriptor::get(format!("/api/form-definition/{id}"))).await
}

/// Latest version of a form.
pub async fn definition_by_key(gateway: &Gateway, form_key: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::get(format!("/api/form-definition/by-key/{form_key}")),
    )
    .await
}

pub async fn definition_versions(gateway: &Gateway, form_key: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::get(format!("/api/form-definition/versions/{form_key}")),
    )
    .await
}

pub async fn list_definitions(
    gateway: &Gateway,
    params: &[(&str, &str)],
) -> Result<Value, GatewayError> {
    let mut request = RequestDescriptor::get("/api/form-definition/list");
    for (key, val) in params {
        request = request.query(*key, val);
    }
    value(gateway, request).await
}

pub async fn published_definitions(gateway: &Gateway) -> Result<Value, GatewayError> {
    value(gateway, RequestDescriptor::get("/api/form-definition/published")).await
}

// --- data ---

pub async fn submit_data(gateway: &Gateway, data: &Value) -> Result<Value, GatewayError> {
    value(gateway, RequestDescriptor::post("/api/form-data/submit").json(data.clone())).await
}

pub async fn update_data(gateway: &Gateway, id: i64, data: &Value) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::put(format!("/api/form-data/{id}")).json(data.clone()),
    )
    .await
}

pub async fn get_data(gateway: &Gateway, id: i64) -> Result<Value, GatewayError> {
    value(gateway, RequestDescriptor::get(format!("/api/form-data/{id}"))).await
}

pub async fn data_by_process(gateway: &Gateway, process_instance_id: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::get(format!("/api/form-data/by-process/{process_instance_id}")),
    )
    .await
}

pub async fn data_by_task(gateway: &Gateway, task_id: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::get(format!("/api/form-data/by-task/{task_id}")),
    )
    .await
}

pub async fn data_by_business_key(gateway: &Gateway, business_key: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::get(format!("/api/form-data/by-business/{business_key}")),
    )
    .await
}

pub async fn data_by_form_key(gateway: &Gateway, form_key: &str) -> Result<Value, GatewayError> {
    value(
        gateway,
        RequestDescriptor::get(format!("/api/form-data/by-form-key/{form_key}")),
    )
    .await
}

pub async fn delete_data(gateway: &Gateway, id: i64) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::delete(format!("/api/form-data/{id}")))
        .await
        .map(drop)
}
