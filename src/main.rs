use std::process::ExitCode;

use colored_hut::app;

fn main() -> ExitCode {
    let result = app::run();
    if let Err(e) = &result {
        log::error!("{:#}", e);
    }
    ExitCode::from(app::exit_status(&result))
}
