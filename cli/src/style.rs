use chrono::Local;
use colored::{Color, ColoredString, Colorize};
use once_cell::sync::Lazy;

use autotest_core::{Program, ProgramStatus, RunResult, TestStatus};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

static TRUECOLOR: Lazy<bool> = Lazy::new(|| {
    matches!(
        std::env::var("COLORTERM").as_deref(),
        Ok("truecolor") | Ok("24bit")
    )
});

pub trait ColorTheme {
    fn color(&self) -> Color;
}

const GREEN: Color = Color::TrueColor { r: 30, g: 180, b: 40 };
const ORANGE: Color = Color::TrueColor { r: 210, g: 138, b: 4 };
const RED: Color = Color::TrueColor { r: 220, g: 42, b: 42 };
const PURPLE: Color = Color::TrueColor { r: 171, g: 40, b: 200 };

fn pick(truecolor: Color, fallback: Color) -> Color {
    if *TRUECOLOR {
        truecolor
    } else {
        fallback
    }
}

impl ColorTheme for ProgramStatus {
    fn color(&self) -> Color {
        use ProgramStatus::*;
        match self {
            FinishedTesting | Graded => pick(GREEN, Color::Green),
            AwaitingTests | CurrentlyTesting => Color::Cyan,
            CompileError | NoSourcesFound => pick(ORANGE, Color::Yellow),
            Plagiarized | Rejected => pick(RED, Color::Red),
            Canceled => Color::BrightBlack,
        }
    }
}

impl ColorTheme for TestStatus {
    fn color(&self) -> Color {
        use TestStatus::*;
        match self {
            Success => pick(GREEN, Color::Green),
            WrongOutput | OutputNotFound => pick(ORANGE, Color::Yellow),
            ExecutionTimeout | ExecutionCrash | UnexpectedException => pick(RED, Color::Red),
            SymbolNotFound | CompileFailed => pick(PURPLE, Color::Magenta),
            ProfilerError | InternalError | UnzipFailed | ToolFailed => Color::BrightBlack,
        }
    }
}

pub fn badge(label: impl std::fmt::Display, color: Color) -> ColoredString {
    let fg = pick(Color::TrueColor { r: 255, g: 255, b: 255 }, Color::BrightBlack);
    format!(" {} ", label).on_color(color).bold().color(fg)
}

/// One-line progress text for a running program.
pub fn progress_message(program: &Program) -> String {
    let Some(result) = &program.result else {
        return program.status.description().to_owned();
    };
    if result.is_waiting {
        return format!("Waiting in queue ({} ahead)", result.in_queue);
    }
    format!(
        "Testing: {}/{} done, {} failed",
        result.completed_tests,
        program.total_tests,
        result.failed()
    )
}

pub fn print_run_result(program: &Program, result: &RunResult) {
    let name = Program::display_name(&program.dir);
    println!(
        "\n{} {} {}",
        name.bright_yellow().bold(),
        badge(program.status, program.status.color()),
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
    );

    for t in &result.test_results {
        println!(
            "  {:>4}  {}  {}",
            format!("#{}", t.id).dimmed(),
            if t.success { "✔".green() } else { "✘".bright_red() },
            t.status.description().color(t.status.color()),
        );
    }

    let bar = "-".repeat(5);
    let passed = result.passed();
    let total = result.test_results.len();
    let msg = if total == 0 {
        "No test results".bright_black()
    } else if passed == total {
        format!("All {} tests passed ✨", total).green()
    } else {
        format!("{}/{} tests failed 💣", total - passed, total).bright_red()
    };
    println!("{} {} {}", bar, msg, bar);
}
