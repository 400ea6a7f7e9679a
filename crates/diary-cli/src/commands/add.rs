use std::path::PathBuf;

use diary_core::media::UploadState;
use diary_core::models::ImageSelection;
use diary_core::Error;

use crate::commands::common::{load_entries, open_controller};
use crate::error::CliError;

pub async fn run_add(
    title: String,
    description: String,
    image_paths: &[PathBuf],
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let images = image_paths
        .iter()
        .map(|path| ImageSelection::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let (mut controller, _) = open_controller(global_profile)?;
    load_entries(&mut controller).await?;

    controller.open_submission();
    controller.update_draft(title, description);
    for image in images {
        controller.attach_image(image);
    }

    let view = controller.view_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            view.cancel();
        }
    });

    let total = image_paths.len();
    let submitted = controller
        .submit_observed(|task| match &task.state {
            UploadState::Uploading => {
                eprintln!(
                    "Uploading image {}/{}: {}",
                    task.index + 1,
                    total,
                    task.source.file_name
                );
            }
            UploadState::Failed(message) => {
                eprintln!("Upload of {} failed: {message}", task.source.file_name);
            }
            UploadState::Pending | UploadState::Succeeded(_) => {}
        })
        .await;
    interrupt.abort();

    let created = match submitted {
        Ok(entry) => entry,
        Err(Error::Cancelled) => {
            eprintln!("Interrupted; images uploaded so far were discarded.");
            return Err(CliError::Notified(Error::Cancelled));
        }
        Err(error) => return Err(CliError::Notified(error)),
    };
    println!("{}", created.id);
    Ok(())
}
