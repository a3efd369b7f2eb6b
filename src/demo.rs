//! Scripted leave-process walkthrough.
//!
//! Deploy → list definitions → start an instance → list the applicant's
//! pending tasks. Each step waits for the previous call to resolve; the
//! first failure aborts the steps that depend on it.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::api::{self, DeployRequest, ProcessInstance, StartInstanceRequest, Task};
use crate::gateway::Gateway;
use crate::screens::{format_definitions, format_tasks};

/// Leave process shipped with the binary.
pub const DEMO_BPMN: &str = include_str!("../assets/demo-leave-process.bpmn");

pub const DEMO_PROCESS_KEY: &str = "leave_request_demo";
pub const DEMO_APPLICANT: &str = "zhangsan";

/// What a completed walkthrough produced.
#[derive(Debug)]
pub struct DemoReport {
    pub deployment_id: String,
    pub definitions: usize,
    pub instance: ProcessInstance,
    pub pending: Vec<Task>,
}

fn business_key() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("LEAVE_{millis}")
}

fn demo_variables() -> Map<String, Value> {
    let vars = json!({
        "applicant": DEMO_APPLICANT,
        "reason": "personal matters, three days off",
        "startDate": "2025-11-10",
        "endDate": "2025-11-12",
        "days": 3
    });
    match vars {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn step(n: usize, label: &str) {
    println!("\n[{n}/4] {label}");
}

/// Run the walkthrough against the configured backend.
pub async fn run(gateway: &Gateway, bpmn_xml: &str) -> Result<DemoReport> {
    println!("Flowable leave process walkthrough");

    step(1, "deploying process definition...");
    let deployment_id = api::process::deploy_definition(
        gateway,
        &DeployRequest {
            name: "Leave request demo".to_string(),
            key: DEMO_PROCESS_KEY.to_string(),
            category: "demo".to_string(),
            bpmn_xml: bpmn_xml.to_string(),
        },
    )
    .await
    .context("deploy failed, walkthrough aborted")?;
    println!("  ✓ deployed, deployment id {deployment_id}");

    step(2, "listing process definitions...");
    let definitions = api::process::list_definitions(gateway)
        .await
        .context("listing definitions failed, walkthrough aborted")?;
    print!("{}", format_definitions(&definitions));

    step(3, "starting a process instance...");
    let instance = api::process::start_instance(
        gateway,
        &StartInstanceRequest {
            process_definition_key: DEMO_PROCESS_KEY.to_string(),
            business_key: business_key(),
            variables: demo_variables(),
        },
    )
    .await
    .context("starting the instance failed, walkthrough aborted")?;
    println!(
        "  ✓ started instance {} (business key {})",
        instance.id,
        instance.business_key.as_deref().unwrap_or("-")
    );

    step(4, &format!("pending tasks for {DEMO_APPLICANT}..."));
    let pending = api::task::pending(gateway, DEMO_APPLICANT)
        .await
        .context("listing pending tasks failed")?;
    print!("{}", format_tasks(&pending));

    info!(deployment_id = %deployment_id, instance = %instance.id, pending = pending.len(), "walkthrough finished");
    println!("\n✓ walkthrough complete");

    Ok(DemoReport {
        deployment_id,
        definitions: definitions.len(),
        instance,
        pending,
    })
}
