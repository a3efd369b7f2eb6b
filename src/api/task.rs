use serde_json::{Map, Value};

use super::{Approval, Task};
use crate::gateway::{Gateway, GatewayError, RequestDescriptor};

pub async fn pending(gateway: &Gateway, user_id: &str) -> Result<Vec<Task>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get("/api/task/pending").query("userId", user_id))
        .await
}

pub async fn completed(gateway: &Gateway, user_id: &str) -> Result<Vec<Task>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get("/api/task/completed").query("userId", user_id))
        .await
}

pub async fn candidate(gateway: &Gateway, user_id: &str) -> Result<Vec<Task>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get("/api/task/candidate").query("userId", user_id))
        .await
}

pub async fn get(gateway: &Gateway, task_id: &str) -> Result<Task, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!("/api/task/{task_id}")))
        .await
}

pub async fn complete(
    gateway: &Gateway,
    task_id: &str,
    approval: &Approval,
) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::post(format!("/api/task/{task_id}/complete")).json_from(approval)?)
        .await?
        .into_json()
}

pub async fn reject(
    gateway: &Gateway,
    task_id: &str,
    approval: &Approval,
) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::post(format!("/api/task/{task_id}/reject")).json_from(approval)?)
        .await
        .map(drop)
}

pub async fn transfer(gateway: &Gateway, task_id: &str, target_user_id: &str) -> Result<(), GatewayError> {
    gateway
        .send(
            RequestDescriptor::post(format!("/api/task/{task_id}/transfer"))
                .query("targetUserId", target_user_id),
        )
        .await
        .map(drop)
}

pub async fn delegate(gateway: &Gateway, task_id: &str, delegate_user_id: &str) -> Result<(), GatewayError> {
    gateway
        .send(
            RequestDescriptor::post(format!("/api/task/{task_id}/delegate"))
                .query("delegateUserId", delegate_user_id),
        )
        .await
        .map(drop)
}

pub async fn claim(gateway: &Gateway, task_id: &str, user_id: &str) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::post(format!("/api/task/{task_id}/claim")).query("userId", user_id))
        .await
        .map(drop)
}

pub async fn variables(gateway: &Gateway, task_id: &str) -> Result<Map<String, Value>, GatewayError> {
    gateway
        .send_json(RequestDescriptor::get(format!("/api/task/{task_id}/variables")))
        .await
}

pub async fn set_variables(
    gateway: &Gateway,
    task_id: &str,
    variables: Map<String, Value>,
) -> Result<(), GatewayError> {
    gateway
        .send(
            RequestDescriptor::put(format!("/api/task/{task_id}/variables"))
                .json(Value::Object(variables)),
        )
        .await
        .map(drop)
}
