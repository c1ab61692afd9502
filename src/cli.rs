use cloudhabit::Cli;

fn main() -> anyhow::Result<()> {
    Cli::run()
}
