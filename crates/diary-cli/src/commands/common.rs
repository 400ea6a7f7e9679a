use chrono::{DateTime, Utc};
use diary_core::api::{DiaryBackend, HttpDiaryBackend};
use diary_core::config::ClientConfig;
use diary_core::controller::{DiaryController, Notifier};
use diary_core::media::{AssetHost, HttpAssetHost};
use diary_core::session::{Router, SessionManager, TokenStorage};
use diary_core::{DiaryEntry, EntryId};
use serde::Serialize;

use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;
use crate::terminal::{TerminalNotifier, TerminalRouter};
use crate::token_store::KeyringTokenStorage;

pub type CliController = DiaryController<
    HttpDiaryBackend,
    Option<HttpAssetHost>,
    KeyringTokenStorage,
    TerminalNotifier,
    TerminalRouter,
>;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub media: Vec<String>,
    pub created_at: String,
    pub relative_time: String,
}

/// Build a controller wired to the given profile's endpoints and token.
pub fn open_controller(global_profile: Option<&str>) -> Result<(CliController, String), CliError> {
    let config = CliProfilesConfig::load()?;
    let profile_name = config.resolve_profile_name(global_profile);
    let client_config = match config.profile(&profile_name) {
        Some(profile) => profile.client_config()?,
        None => ClientConfig::from_env()?,
    };

    let backend = HttpDiaryBackend::new(&client_config)?;
    let asset_host = if client_config.asset_host.is_some() {
        Some(HttpAssetHost::new(&client_config)?)
    } else {
        None
    };
    let session = SessionManager::new(KeyringTokenStorage::for_profile(&profile_name));

    let controller = DiaryController::new(
        session,
        backend,
        asset_host,
        TerminalNotifier,
        TerminalRouter::default(),
    );
    Ok((controller, profile_name))
}

/// Mount the diary view, failing when the profile has no session token or
/// the entry list could not be fetched.
pub async fn load_entries<B, H, S, N, R>(
    controller: &mut DiaryController<B, H, S, N, R>,
) -> Result<(), CliError>
where
    B: DiaryBackend + Clone,
    H: AssetHost,
    S: TokenStorage,
    N: Notifier,
    R: Router,
{
    if !controller.load_view().await.is_allowed() {
        return Err(CliError::NotSignedIn);
    }
    if !controller.entries_loaded() {
        return Err(CliError::EntriesUnavailable);
    }
    Ok(())
}

/// Resolve a full entry id or a unique id prefix against the loaded entries.
pub fn resolve_entry_id(entries: &[DiaryEntry], query: &str) -> Result<EntryId, CliError> {
    let query = normalize_entry_identifier(query)?;
    if let Some(entry) = entries.iter().find(|entry| entry.id.as_str() == query) {
        return Ok(entry.id.clone());
    }

    let matching = entries
        .iter()
        .filter(|entry| entry.id.as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::EntryNotFound(query)),
        [entry] => Ok(entry.id.clone()),
        several => {
            let options = several
                .iter()
                .take(3)
                .map(|entry| short_id(&entry.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousEntryId(format!(
                "Entry ID prefix '{query}' is ambiguous. Matches: {options}"
            )))
        }
    }
}

pub fn format_entry_lines(entries: &[&DiaryEntry]) -> Vec<String> {
    let now = Utc::now();
    entries
        .iter()
        .map(|entry| {
            let short_id = short_id(&entry.id);
            let preview = entry_preview(&entry.title, 40);
            let relative_time = format_relative_time(entry.created_at, now);

            if entry.media.is_empty() {
                format!("{short_id:<13}  {preview:<40}  {relative_time}")
            } else {
                let images = entry.media.len();
                format!("{short_id:<13}  {preview:<40}  {relative_time:<10}  [{images} image(s)]")
            }
        })
        .collect()
}

pub fn format_entry_details(entry: &DiaryEntry) -> Vec<String> {
    let mut lines = vec![
        format!("ID:      {}", entry.id),
        format!("Title:   {}", entry.title),
        format!("Created: {}", entry.created_label()),
        String::new(),
        entry.description.clone(),
    ];
    if !entry.media.is_empty() {
        lines.push(String::new());
        lines.push("Images:".to_string());
        lines.extend(entry.media.iter().map(|url| format!("  {url}")));
    }
    lines
}

pub fn entry_to_list_item(entry: &DiaryEntry) -> EntryListItem {
    EntryListItem {
        id: entry.id.to_string(),
        title: entry.title.clone(),
        description: entry.description.clone(),
        media: entry.media.clone(),
        created_at: entry.created_at.to_rfc3339(),
        relative_time: format_relative_time(entry.created_at, Utc::now()),
    }
}

pub fn print_entries(entries: &[&DiaryEntry], as_json: bool) -> Result<(), CliError> {
    if as_json {
        let json_items = entries
            .iter()
            .map(|entry| entry_to_list_item(entry))
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_entry_lines(entries) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn short_id(id: &EntryId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn entry_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(timestamp).num_minutes().max(0);
    let hour = 60;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < 1 {
        "just now".to_string()
    } else if diff < hour {
        format!("{diff}m ago")
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_search_term(term: &str) -> Result<String, CliError> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchTerm)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEntryId)
    } else {
        Ok(trimmed.to_string())
    }
}
