use crate::commands::common::{format_entry_details, load_entries, open_controller, resolve_entry_id};
use crate::error::CliError;

pub async fn run_show(id: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let (mut controller, _) = open_controller(global_profile)?;
    load_entries(&mut controller).await?;

    let entry_id = resolve_entry_id(controller.store().entries(), id)?;
    let entry = controller.select(&entry_id)?;
    for line in format_entry_details(entry) {
        println!("{line}");
    }
    Ok(())
}
