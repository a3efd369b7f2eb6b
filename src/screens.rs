//! Text screens printed after a navigation proceeds.

use anyhow::{Result, bail};
use serde_json::Value;

use crate::api::{self, ProcessDefinition, ProcessInstance, Task};
use crate::gateway::Gateway;
use crate::router::{RouteMatch, Screen};

/// Assignee the backend falls back to when none is given.
const FALLBACK_USER: &str = "user1";

fn current_username(gateway: &Gateway) -> String {
    gateway
        .session()
        .user_info()
        .ok()
        .flatten()
        .map(|info| info.username)
        .unwrap_or_else(|| FALLBACK_USER.to_string())
}

/// Fetch and format the data a screen shows.
pub async fn render(gateway: &Gateway, matched: &RouteMatch) -> Result<String> {
    let Some(screen) = matched.route.screen else {
        bail!("route {} has no screen", matched.route.path);
    };

    let user = current_username(gateway);
    let text = match screen {
        Screen::Login => "  signed out. use /login to sign in".to_string(),
        Screen::Home => {
            let who = gateway
                .session()
                .user_info()?
                .map(|info| info.display_name().to_string())
                .unwrap_or_else(|| user.clone());
            format!("  welcome, {who}. try /go /dashboard or /help")
        }
        Screen::Dashboard => {
            let (tasks, instances) = futures::try_join!(
                api::task::pending(gateway, &user),
                api::process::running_instances(gateway),
            )?;
            format!(
                "  pending tasks      {}\n  running instances  {}\n\n{}",
                tasks.len(),
                instances.len(),
                format_tasks(&tasks)
            )
        }
        Screen::LeaveApply => {
            "  submit a leave request with:\n  /call POST /api/leave/submit {\"applicant\":..., \"leaveType\":..., \"startDate\":..., \"endDate\":..., \"days\":..., \"reason\":...}"
                .to_string()
        }
        Screen::LeaveList => {
            let (mine, stats) = futures::try_join!(
                api::leave::my_list(gateway, &[]),
                api::leave::statistics(gateway),
            )?;
            format!("{}\n\n  statistics\n{}", format_value(&mine), format_value(&stats))
        }
        Screen::LeavePending => format_value(&api::leave::pending_list(gateway, &[]).await?),
        Screen::LeaveDetail => {
            let Some(id) = matched.param("id") else {
                bail!("missing leave id");
            };
            format_value(&api::leave::detail(gateway, id).await?)
        }
        Screen::ProcessDesigner => {
            "  the BPMN designer is graphical; deploy a file with `flowdesk deploy <file.bpmn>`"
                .to_string()
        }
        Screen::ProcessDefinitions => {
            format_definitions(&api::process::list_definitions(gateway).await?)
        }
        Screen::ProcessInstances => format_instances(&api::process::all_instances(gateway).await?),
        Screen::ProcessTemplates => format_value(&api::process::list_templates(gateway).await?),
        Screen::MyTasks => format_tasks(&api::task::pending(gateway, &user).await?),
    };
    Ok(text)
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

pub fn format_definitions(definitions: &[ProcessDefinition]) -> String {
    if definitions.is_empty() {
        return "  (no process definitions)".to_string();
    }
    let mut out = String::new();
    for (i, def) in definitions.iter().enumerate() {
        let state = if def.suspended.unwrap_or(false) {
            "suspended"
        } else {
            "active"
        };
        out.push_str(&format!(
            "  {}. {} [{}] v{} {}\n     id {}  category {}  deployed {}\n",
            i + 1,
            or_dash(&def.name),
            def.key,
            def.version.unwrap_or_default(),
            state,
            def.id,
            or_dash(&def.category),
            or_dash(&def.deployment_time),
        ));
    }
    out
}

pub fn format_instances(instances: &[ProcessInstance]) -> String {
    if instances.is_empty() {
        return "  (no process instances)".to_string();
    }
    let mut out = String::new();
    for inst in instances {
        out.push_str(&format!(
            "  {}  {}  business key {}  started {}\n",
            inst.id,
            or_dash(&inst.process_definition_key),
            or_dash(&inst.business_key),
            or_dash(&inst.start_time),
        ));
    }
    out
}

pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "  (no pending tasks)".to_string();
    }
    let mut out = String::new();
    for (i, task) in tasks.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {}\n     task {}  instance {}  assignee {}  created {}  priority {}\n",
            i + 1,
            or_dash(&task.name),
            task.id,
            or_dash(&task.process_instance_id),
            task.assignee.as_deref().unwrap_or("unassigned"),
            or_dash(&task.create_time),
            task.priority.unwrap_or_default(),
        ));
    }
    out
}

pub fn format_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_have_placeholders() {
        assert!(format_definitions(&[]).contains("no process definitions"));
        assert!(format_instances(&[]).contains("no process instances"));
        assert!(format_tasks(&[]).contains("no pending tasks"));
    }

    #[test]
    fn task_without_assignee_is_unassigned() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "t-9",
            "name": "Manager approval"
        }))
        .unwrap();
        let text = format_tasks(&[task]);
        assert!(text.contains("Manager approval"));
        assert!(text.contains("unassigned"));
    }

    #[test]
    fn definition_shows_state() {
        let def: ProcessDefinition = serde_json::from_value(serde_json::json!({
            "id": "leave:1:4",
            "key": "leave",
            "name": "Leave",
            "version": 1,
            "suspended": true
        }))
        .unwrap();
        let text = format_definitions(&[def]);
        assert!(text.contains("[leave] v1 suspended"));
    }
}
