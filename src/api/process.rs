use serde_json::Value;

use super::{DeployRequest, ProcessDefinition, ProcessInstance, StartInstanceRequest};
use crate::gateway::{FormPart, Gateway, GatewayError, RequestDescriptor};

// --- definitions ---

pub async fn list_definitions(gateway: &Gateway) -> Result<Vec<ProcessDefinition>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get("/api/process-definition/list"))
        .await
}

pub async fn get_definition(gateway: &Gateway, id: &str) -> Result<ProcessDefinition, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!("/api/process-definition/{id}")))
        .await
}

pub async fn definition_versions(
    gateway: &Gateway,
    key: &str,
) -> Result<Vec<ProcessDefinition>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!(
            "/api/process-definition/versions/{key}"
        )))
        .await
}

/// BPMN XML of a deployed definition.
pub async fn definition_xml(gateway: &Gateway, id: &str) -> Result<String, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!(
            "/api/process-definition/{id}/xml"
        )))
        .await
}

/// Deploy from inline XML; resolves to the deployment id.
pub async fn deploy_definition(
    gateway: &Gateway,
    request: &DeployRequest,
) -> Result<String, GatewayError> {
    gateway
        .send_json(RequestDescriptor::post("/api/process-definition/deploy").json_from(request)?)
        .await
}

/// Deploy by uploading a BPMN file; resolves to the deployment id.
pub async fn upload_bpmn(
    gateway: &Gateway,
    name: &str,
    category: Option<&str>,
    file_name: &str,
    xml: Vec<u8>,
) -> Result<String, GatewayError> {
    let mut parts = vec![
        FormPart::text("name", name),
        FormPart::file("file", file_name, "application/xml", xml),
    ];
    if let Some(category) = category {
        parts.push(FormPart::text("category", category));
    }
    gateway
        .send_json(RequestDescriptor::post("/api/process-definition/upload").multipart(parts))
        .await
}

pub async fn delete_definition(
    gateway: &Gateway,
    deployment_id: &str,
    cascade: bool,
) -> Result<(), GatewayError> {
    gateway
        .send(
            RequestDescriptor::delete(format!("/api/process-definition/{deployment_id}"))
                .query("cascade", cascade),
        )
        .await
        .map(drop)
}

pub async fn activate_definition(gateway: &Gateway, id: &str) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::put(format!(
            "/api/process-definition/{id}/activate"
        )))
        .await
        .map(drop)
}

pub async fn suspend_definition(gateway: &Gateway, id: &str) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::put(format!(
            "/api/process-definition/{id}/suspend"
        )))
        .await
        .map(drop)
}

// --- instances ---

pub async fn start_instance(
    gateway: &Gateway,
    request: &StartInstanceRequest,
) -> Result<ProcessInstance, GatewayError> {
    gateway
        .send_json(RequestDescriptor::post("/api/process-instance/start").json_from(request)?)
        .await
}

pub async fn running_instances(gateway: &Gateway) -> Result<Vec<ProcessInstance>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get("/api/process-instance/running"))
        .await
}

pub async fn all_instances(gateway: &Gateway) -> Result<Vec<ProcessInstance>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get("/api/process-instance/all"))
        .await
}

pub async fn instances_by_key(
    gateway: &Gateway,
    key: &str,
) -> Result<Vec<ProcessInstance>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!(
            "/api/process-instance/by-key/{key}"
        )))
        .await
}

pub async fn get_instance(gateway: &Gateway, id: &str) -> Result<ProcessInstance, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!("/api/process-instance/{id}")))
        .await
}

pub async fn suspend_instance(gateway: &Gateway, id: &str) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::put(format!(
            "/api/process-instance/{id}/suspend"
        )))
        .await
        .map(drop)
}

pub async fn activate_instance(gateway: &Gateway, id: &str) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::put(format!(
            "/api/process-instance/{id}/activate"
        )))
        .await
        .map(drop)
}

pub async fn delete_instance(
    gateway: &Gateway,
    id: &str,
    reason: Option<&str>,
) -> Result<(), GatewayError> {
    let mut request = RequestDescriptor::delete(format!("/api/process-instance/{id}"));
    if let Some(reason) = reason {
        request = request.query("reason", reason);
    }
    gateway.send(request).await.map(drop)
}

/// Id of the activity the instance is waiting in.
pub async fn current_activity(gateway: &Gateway, id: &str) -> Result<Option<String>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!(
            "/api/process-instance/{id}/current-activity"
        )))
        .await
}

// --- templates ---

pub async fn list_templates(gateway: &Gateway) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get("/api/process-template/list"))
        .await?
        .into_json()
}

pub async fn get_template(gateway: &Gateway, id: &str) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get(format!("/api/process-template/{id}")))
        .await?
        .into_json()
}
