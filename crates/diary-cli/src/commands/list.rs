use crate::commands::common::{load_entries, open_controller, print_entries};
use crate::error::CliError;

pub async fn run_list(as_json: bool, global_profile: Option<&str>) -> Result<(), CliError> {
    let (mut controller, _) = open_controller(global_profile)?;
    load_entries(&mut controller).await?;

    let entries = controller.store().entries().iter().collect::<Vec<_>>();
    print_entries(&entries, as_json)
}
