//! Users, roles and permissions.
//!
//! The three resources share one shape (CRUD plus a list endpoint), so they
//! are addressed through [`Resource`].

use serde_json::{Value, json};

use crate::gateway::{Gateway, GatewayError, RequestDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Role,
    Permission,
}

impl Resource {
    fn root(&self) -> &'static str {
        match self {
            Self::User => "/api/user",
            Self::Role => "/api/role",
            Self::Permission => "/api/permission",
        }
    }
}

pub async fn list(
    gateway: &Gateway,
    resource: Resource,
    params: &[(&str, &str)],
) -> Result<Value, GatewayError> {
    let mut request = RequestDescriptor::get(format!("{}/list", resource.root()));
    for (key, val) in params {
        request = request.query(*key, val);
    }
    gateway.send(request).await?.into_json()
}

pub async fn get(gateway: &Gateway, resource: Resource, id: i64) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get(format!("{}/{id}", resource.root())))
        .await?
        .into_json()
}

pub async fn create(gateway: &Gateway, resource: Resource, body: &Value) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::post(resource.root()).json(body.clone()))
        .await?
        .into_json()
}

pub async fn update(
    gateway: &Gateway,
    resource: Resource,
    id: i64,
    body: &Value,
) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::put(format!("{}/{id}", resource.root())).json(body.clone()))
        .await?
        .into_json()
}

pub async fn delete(gateway: &Gateway, resource: Resource, id: i64) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::delete(format!("{}/{id}", resource.root())))
        .await
        .map(drop)
}

pub async fn assign_roles(gateway: &Gateway, user_id: i64, role_ids: &[i64]) -> Result<(), GatewayError> {
    gateway
        .send(RequestDescriptor::post(format!("/api/user/{user_id}/roles")).json(json!(role_ids)))
        .await
        .map(drop)
}

pub async fn assign_permissions(
    gateway: &Gateway,
    role_id: i64,
    permission_ids: &[i64],
) -> Result<(), GatewayError> {
    gateway
        .send(
            RequestDescriptor::post(format!("/api/role/{role_id}/permissions"))
                .json(json!(permission_ids)),
        )
        .await
        .map(drop)
}

pub async fn permission_tree(gateway: &Gateway) -> Result<Value, GatewayError> {
    gateway
        .send(RequestDescriptor::get("/api/permission/tree"))
        .await?
        .into_json()
}
