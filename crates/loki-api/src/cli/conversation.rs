//! Conversation CLI commands: list, show, delete.
//!
//! These work straight against the local store and never contact the
//! completion provider.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use loki_core::chat::repository::ConversationRepository;
use loki_types::chat::{ChatRole, ConversationId, format_timestamp};
use loki_types::dto::ConversationResponse;

/// Width of the message preview column.
const PREVIEW_CHARS: usize = 50;

/// List conversations, most recently updated first.
///
/// # Examples
///
/// ```bash
/// loki list
/// loki list --limit 5 --json
/// ```
pub async fn list_conversations(
    repo: &impl ConversationRepository,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let conversations = repo.list_conversations(limit).await?;

    if json {
        let mut out = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            let messages = repo.get_messages(&conversation.id).await?;
            out.push(ConversationResponse::from_parts(conversation, &messages));
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!();
        println!(
            "  {} No conversations yet. Start the server with: {}",
            style("i").blue().bold(),
            style("loki serve").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Last Message").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for conversation in &conversations {
        let messages = repo.get_messages(&conversation.id).await?;
        let last = messages
            .last()
            .map(|m| preview(&m.content, PREVIEW_CHARS))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(&conversation.title).fg(Color::Cyan),
            Cell::new(messages.len()),
            Cell::new(last),
            Cell::new(conversation.updated_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
            Cell::new(conversation.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(conversations.len()).bold(),
        if conversations.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show a conversation and its full transcript.
pub async fn show_conversation(
    repo: &impl ConversationRepository,
    id: &str,
    json: bool,
) -> Result<()> {
    let conversation_id = parse_id(id)?;
    let conversation = repo
        .get_conversation(&conversation_id)
        .await?
        .with_context(|| format!("Conversation '{id}' not found"))?;
    let messages = repo.get_messages(&conversation_id).await?;

    if json {
        let response = ConversationResponse::from_parts(&conversation, &messages);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&conversation.title).cyan().bold());
    println!("  {}", style(conversation.id.to_string()).dim());
    println!();
    println!("  {}", style("── Timestamps ──").dim());
    println!(
        "  {} {}",
        style("Created:").bold(),
        format_timestamp(&conversation.created_at)
    );
    println!(
        "  {} {}",
        style("Updated:").bold(),
        format_timestamp(&conversation.updated_at)
    );
    println!();

    println!("  {}", style("── Messages ──").dim());
    if messages.is_empty() {
        println!("  {}", style("(no messages)").dim());
    }
    for message in &messages {
        let speaker = match message.role {
            ChatRole::User => style("You").green().bold(),
            ChatRole::Assistant => style("Assistant").magenta().bold(),
        };
        println!(
            "  {} {}",
            speaker,
            style(message.created_at.format("%H:%M:%S")).dim()
        );
        for line in message.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}

/// Delete a conversation permanently with confirmation.
pub async fn delete_conversation(
    repo: &impl ConversationRepository,
    id: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let conversation_id = parse_id(id)?;
    let conversation = repo
        .get_conversation(&conversation_id)
        .await?
        .with_context(|| format!("Conversation '{id}' not found"))?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete '{}' and all its messages?",
                style(&conversation.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    repo.delete_conversation(&conversation_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "id": conversation_id.to_string()})
        );
    } else {
        println!(
            "  {} Conversation '{}' deleted.",
            style("✓").red().bold(),
            conversation.title
        );
    }

    Ok(())
}

fn parse_id(id: &str) -> Result<ConversationId> {
    id.parse::<ConversationId>()
        .with_context(|| format!("Conversation '{id}' not found"))
}

/// First line of `content`, cut to `max` characters with an ellipsis.
fn preview(content: &str, max: usize) -> String {
    let line = content.lines().next().unwrap_or("").trim();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use loki_infra::sqlite::chat::SqliteConversationRepository;
    use loki_infra::sqlite::pool::{DatabasePool, default_database_url};
    use loki_types::chat::{ChatMessage, Conversation};

    async fn repo_with_conversation() -> (SqliteConversationRepository, Conversation, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&default_database_url(dir.path()))
            .await
            .unwrap();
        let repo = SqliteConversationRepository::new(pool);
        let conversation = Conversation::new("Trip Planning");
        repo.create_conversation(&conversation).await.unwrap();
        let user = ChatMessage::user(conversation.id, "Where to?");
        let assistant = ChatMessage::assistant(conversation.id, "Lisbon.", user.created_at);
        repo.append_exchange(&conversation.id, &user, &assistant, assistant.created_at)
            .await
            .unwrap();
        (repo, conversation, dir)
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("first line\nsecond", 20), "first line");
        assert_eq!(preview("ééééééééééé", 8), "ééééé...");
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("nope").is_err());
        assert!(parse_id(&ConversationId::new().to_string()).is_ok());
    }

    #[tokio::test]
    async fn test_list_and_show_json() {
        let (repo, conversation, _dir) = repo_with_conversation().await;
        list_conversations(&repo, None, true).await.unwrap();
        show_conversation(&repo, &conversation.id.to_string(), true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_show_unknown_conversation_fails() {
        let (repo, _, _dir) = repo_with_conversation().await;
        let err = show_conversation(&repo, &ConversationId::new().to_string(), true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_delete_with_json_skips_prompt() {
        let (repo, conversation, _dir) = repo_with_conversation().await;
        delete_conversation(&repo, &conversation.id.to_string(), false, true)
            .await
            .unwrap();
        assert!(repo.get_conversation(&conversation.id).await.unwrap().is_none());
    }
}
