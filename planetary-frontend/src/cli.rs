use clap::Parser;

/// Posts a random image from the PDS Planetary Rings Node
#[derive(Parser, Debug)]
#[command(name = "planetary-bot", version)]
pub struct Cli {
    /// `test` prints the caption without posting
    pub args: Vec<String>,
}

impl Cli {
    /// Any `test` argument selects a dry run; everything else posts for real
    pub fn dry_run(&self) -> bool {
        self.args.iter().any(|arg| arg == "test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_test_argument_selects_dry_run() {
        assert!(parse(&["planetary-bot", "test"]).dry_run());
        assert!(parse(&["planetary-bot", "now", "test"]).dry_run());
    }

    #[test]
    fn test_other_arguments_post_live() {
        assert!(!parse(&["planetary-bot"]).dry_run());
        assert!(!parse(&["planetary-bot", "other"]).dry_run());
        assert!(!parse(&["planetary-bot", "TEST"]).dry_run());
    }
}
