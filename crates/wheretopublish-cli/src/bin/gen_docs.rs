//! Binary that prints the command-line options as a markdown table on stdout.

fn main() {
    print!("{}", wheretopublish_cli::render_options_markdown());
}
