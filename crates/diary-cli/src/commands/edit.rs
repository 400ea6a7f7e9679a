use crate::commands::common::{load_entries, open_controller, resolve_entry_id};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<String>,
    description: Option<String>,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    if title.is_none() && description.is_none() {
        return Err(CliError::NothingToEdit);
    }

    let (mut controller, _) = open_controller(global_profile)?;
    load_entries(&mut controller).await?;

    let entry_id = resolve_entry_id(controller.store().entries(), id)?;
    let (current_title, current_description) = controller
        .store()
        .get(&entry_id)
        .map(|entry| (entry.title.clone(), entry.description.clone()))
        .ok_or_else(|| CliError::EntryNotFound(entry_id.to_string()))?;

    controller.begin_edit(&entry_id)?;
    let updated = controller
        .save_edit(
            &title.unwrap_or(current_title),
            &description.unwrap_or(current_description),
        )
        .await
        .map_err(CliError::Notified)?;
    println!("{}", updated.id);
    Ok(())
}
