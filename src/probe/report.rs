//! Console output and the final summary.

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use super::{Outcome, ProbeArgs, ProbeReport};

/// Color of one console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Banner,
    Heading,
    Pass,
    Fail,
    Warn,
    Info,
}

impl Tone {
    fn color(self) -> Option<Color> {
        match self {
            Tone::Banner => Some(Color::Blue),
            Tone::Heading | Tone::Warn => Some(Color::Yellow),
            Tone::Pass => Some(Color::Green),
            Tone::Fail => Some(Color::Red),
            Tone::Info => None,
        }
    }
}

/// Line-oriented colored writer.
pub struct Console<W: Write> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn line(&mut self, tone: Tone, text: &str) -> io::Result<()> {
        match tone.color() {
            Some(color) => writeln!(self.out, "{}", text.with(color)),
            None => writeln!(self.out, "{text}"),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub(super) fn print_summary<W: Write>(
    console: &mut Console<W>,
    report: &ProbeReport,
    args: &ProbeArgs,
) -> io::Result<()> {
    let rule = "=".repeat(50);
    console.line(Tone::Banner, &format!("\n{rule}"))?;
    console.line(Tone::Banner, "TEST SUMMARY")?;
    console.line(Tone::Banner, &rule)?;

    if report.all_passed() {
        console.line(
            Tone::Pass,
            "\n✅ The detector is properly using Redis for detection storage!",
        )?;
        console.line(Tone::Info, "\nVerified:")?;
        for item in [
            "Redis connection working",
            "Detection results stored in Redis",
            "Detection keys present",
            "Cached detections speed up repeat requests",
            "Detector service running",
        ] {
            console.line(Tone::Info, &format!("  • {item}"))?;
        }
    } else if report.any_passed() {
        console.line(
            Tone::Warn,
            "\n⚠ Detection caching is partially working",
        )?;
        console.line(Tone::Info, "\nIssues found:")?;
        for result in report.results.iter().filter(|r| r.outcome != Outcome::Passed) {
            let state = match result.outcome {
                Outcome::Inconclusive => "inconclusive",
                _ => "failed",
            };
            console.line(
                Tone::Info,
                &format!("  • {}: {state}", result.check.label()),
            )?;
        }
    } else {
        console.line(
            Tone::Fail,
            "\n❌ The detector is NOT properly using Redis",
        )?;
        console.line(Tone::Info, "\nTroubleshooting steps:")?;
        for (i, step) in troubleshooting_steps(args).iter().enumerate() {
            console.line(Tone::Info, &format!("{}. {step}", i + 1))?;
        }
    }

    console.line(Tone::Info, "\nConfiguration:")?;
    console.line(
        Tone::Info,
        &format!(
            "  Redis: {}:{} (DB {})",
            args.redis_host, args.redis_port, args.redis_db
        ),
    )?;
    console.line(Tone::Info, &format!("  Image server: {}", args.image_server))?;

    console.line(Tone::Info, "\nMonitoring commands:")?;
    let cli = format!("redis-cli -h {} -p {}", args.redis_host, args.redis_port);
    console.line(Tone::Info, &format!("  Watch commands: {cli} monitor"))?;
    console.line(
        Tone::Info,
        &format!("  Detector keys: {cli} --scan --pattern '*detector*'"),
    )?;
    console.line(
        Tone::Info,
        &format!("  Service status: supervisorctl status {}", args.service),
    )?;
    Ok(())
}

fn troubleshooting_steps(args: &ProbeArgs) -> Vec<String> {
    vec![
        format!(
            "Check that the detector is running: supervisorctl status {}",
            args.service
        ),
        format!(
            "Check that Redis answers: redis-cli -h {} -p {} ping",
            args.redis_host, args.redis_port
        ),
        format!(
            "Read the detector log: tail -f /app/logs/{}.log",
            args.service
        ),
        "Confirm the image server's detector and storage settings point at this Redis"
            .to_string(),
        "Restart the stack after any configuration change".to_string(),
    ]
}
