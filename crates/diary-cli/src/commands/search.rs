use crate::commands::common::{load_entries, normalize_search_term, open_controller, print_entries};
use crate::error::CliError;

pub async fn run_search(
    term: &str,
    as_json: bool,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let normalized_term = normalize_search_term(term)?;
    let (mut controller, _) = open_controller(global_profile)?;
    load_entries(&mut controller).await?;

    controller.search(normalized_term);
    print_entries(&controller.visible_entries(), as_json)
}
