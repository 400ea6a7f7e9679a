use crate::commands::common::{load_entries, open_controller, resolve_entry_id};
use crate::error::CliError;

pub async fn run_delete(id: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let (mut controller, _) = open_controller(global_profile)?;
    load_entries(&mut controller).await?;

    let entry_id = resolve_entry_id(controller.store().entries(), id)?;
    controller
        .delete(&entry_id)
        .await
        .map_err(CliError::Notified)?;
    println!("{entry_id}");
    Ok(())
}
