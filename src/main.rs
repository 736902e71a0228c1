//! tutorclock main entrypoint.

use tutorclock::run;
use tutorclock::ui::messages;

fn main() {
    if let Err(e) = run() {
        messages::error(&e);
        if e.is_retryable() {
            messages::info("Another process was writing; run the command again.");
        }
        std::process::exit(e.exit_code());
    }
}
