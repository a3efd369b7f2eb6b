use serde_json::Value;

use super::{Approval, LeaveRequest};
use crate::gateway::{Gateway, GatewayError, RequestDescriptor};

/// Start a leave-request process; resolves to the ids the backend assigned.
pub async fn submit(gateway: &Gateway, request: &LeaveRequest) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::post("/api/leave/submit").json_from(request)?)
        .await?
        .into_json()
}

/// Requests the signed-in user filed. The backend identifies the user from
/// the token; `params` carries paging and filters.
pub async fn my_list(gateway: &Gateway, params: &[(&str, &str)]) -> Result<Value, GatewayError> {
    list(gateway, "/api/leave/my-list", params).await
}

/// Requests waiting on the signed-in user's approval.
pub async fn pending_list(gateway: &Gateway, params: &[(&str, &str)]) -> Result<Value, GatewayError> {
    list(gateway, "/api/leave/pending-list", params).await
}

async fn list(gateway: &Gateway, path: &str, params: &[(&str, &str)]) -> Result<Value, GatewayError> {
    let mut request = RequestDescriptor::get(path);
    for (key, val) in params {
        request = request.query(*key, val);
    }
    gateway.send(request).await?.into_json()
}

pub async fn detail(gateway: &Gateway, id: &str) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get(format!("/api/leave/detail/{id}")))
        .await?
        .into_json()
}

pub async fn statistics(gateway: &Gateway) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get("/api/leave/statistics"))
        .await?
        .into_json()
}

/// Approval tasks assigned to `assignee`.
pub async fn tasks(gateway: &Gateway, assignee: &str) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get("/api/leave/tasks").query("assignee", assignee))
        .await?
        .into_json()
}

pub async fn approve(gateway: &Gateway, task_id: &str, approval: &Approval) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::post(format!("/api/leave/approve/{task_id}")).json_from(approval)?)
        .await
        .map(drop)
}

pub async fn reject(gateway: &Gateway, task_id: &str, approval: &Approval) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::post(format!("/api/leave/reject/{task_id}")).json_from(approval)?)
        .await
        .map(drop)
}

pub async fn process_status(gateway: &Gateway, process_instance_id: &str) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get(format!(
            "/api/leave/process/{process_instance_id}"
        )))
        .await?
        .into_json()
}

/// Rendered process diagram (PNG bytes).
pub async fn diagram(gateway: &Gateway, process_instance_id: &str) -> Result<Vec<u8>, GatewayError> {
    gateway
        .send_blob(RequestDescriptor::get(format!(
            "/api/leave/process-diagram/{process_instance_id}"
        )))
        .await
}
