use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = sqlmarks::ui::app::Cli::parse();
    sqlmarks::init(cli.verbose);

    sqlmarks::ui::app::run(cli)
}
