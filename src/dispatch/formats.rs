//! Channel-specific message formatting. Cosmetic only: every channel
//! carries the same alert text, wrapped in whatever shape that channel
//! renders best.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dispatch::NotificationMeta;
use crate::domain::Priority;

/// Block-kit payload for a Slack incoming webhook. `text` doubles as the
/// notification fallback line.
pub fn slack_blocks(message: &str, meta: &NotificationMeta) -> Value {
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": meta.center_name, "emoji": true }
        }),
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": message }
        }),
        json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!(
                    "{} *Priority:* {}",
                    meta.priority.emoji(),
                    meta.priority.as_str().to_uppercase()
                )
            }]
        }),
    ];

    if !meta.action_items.is_empty() {
        let items = meta
            .action_items
            .iter()
            .map(|item| format!("\u{2022} {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*Action Items:*\n{items}") }
        }));
    }

    if let Some(url) = &meta.dashboard_url {
        blocks.push(json!({
            "type": "actions",
            "elements": [{
                "type": "button",
                "text": { "type": "plain_text", "text": "View Dashboard" },
                "url": url,
                "style": "primary"
            }]
        }));
    }

    json!({ "blocks": blocks, "text": message })
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "#dc3545",
        Priority::High => "#ffc107",
        Priority::Medium => "#17a2b8",
        Priority::Low => "#6c757d",
    }
}

/// HTML email body with priority badge, action items, and dashboard link
pub fn email_html(message: &str, meta: &NotificationMeta) -> String {
    let badge = format!(
        r#"<span style="display:inline-block;padding:5px 15px;border-radius:20px;font-size:12px;font-weight:bold;text-transform:uppercase;background:{};color:#fff;">{} priority</span>"#,
        priority_color(meta.priority),
        meta.priority.as_str()
    );

    let action_items = if meta.action_items.is_empty() {
        String::new()
    } else {
        let items = meta
            .action_items
            .iter()
            .map(|item| format!("<li>{item}</li>"))
            .collect::<String>();
        format!(r#"<div class="action-items"><h3>Action Items:</h3><ul>{items}</ul></div>"#)
    };

    let dashboard = meta
        .dashboard_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<div style="text-align:center;margin:20px 0;"><a href="{url}" style="display:inline-block;padding:12px 24px;background:#667eea;color:#fff;text-decoration:none;border-radius:6px;">View Dashboard</a></div>"#
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Performance Alert</title></head>
<body style="font-family:-apple-system,'Segoe UI',Roboto,Arial,sans-serif;line-height:1.6;color:#333;max-width:600px;margin:0 auto;padding:20px;">
  <div style="background:#667eea;color:#fff;padding:30px;border-radius:8px 8px 0 0;">
    <h1 style="margin:0 0 10px 0;">{center}</h1>
    {badge}
  </div>
  <div style="background:#f8f9fa;padding:30px;border-radius:0 0 8px 8px;">
    <div style="background:#fff;padding:20px;border-radius:6px;margin:20px 0;border-left:4px solid #667eea;">
      <p>{message}</p>
    </div>
    {action_items}
    {dashboard}
  </div>
  <div style="text-align:center;margin-top:30px;color:#666;font-size:12px;">
    <p>This is an automated alert from the sales performance portal.</p>
  </div>
</body>
</html>"#,
        center = meta.center_name,
        badge = badge,
        message = message.replace('\n', "<br>"),
        action_items = action_items,
        dashboard = dashboard,
    )
}

/// Web Push notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    /// "high" for critical alerts, "normal" otherwise
    pub priority: String,
    pub data: Value,
}

pub fn push_payload(message: &str, meta: &NotificationMeta) -> PushPayload {
    PushPayload {
        title: meta.center_name.clone(),
        body: message.to_string(),
        icon: "/icon-192.png".to_string(),
        badge: "/icon-192.png".to_string(),
        tag: "performance-alert".to_string(),
        priority: if meta.priority == Priority::Critical {
            "high".to_string()
        } else {
            "normal".to_string()
        },
        data: json!({
            "url": meta.dashboard_url.clone().unwrap_or_else(|| "/dashboard".to_string()),
            "trigger_type": meta.trigger_type.map(|t| t.as_str()),
        }),
    }
}
