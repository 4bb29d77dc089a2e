use std::process;

fn main() {
    match latex_review_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("latex-review error: {err:#}");
            process::exit(1);
        }
    }
}
