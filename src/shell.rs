//! Interactive shell - type a query, get covers and captions back.

use crate::context::AppContext;
use crate::error::Error;
use crate::protocol::RecommendResponse;
use crate::recommender::{CategoryFilter, QueryFilters, Tone};
use log::warn;
use std::io::{self, BufRead, Write};
use termcolor::{Color, ColorSpec, WriteColor};

pub struct Shell<'a> {
    context: &'a AppContext,
    category: CategoryFilter,
    tone: Tone,
}

impl<'a> Shell<'a> {
    pub fn new(context: &'a AppContext) -> Self {
        Self {
            context,
            category: CategoryFilter::All,
            tone: Tone::All,
        }
    }

    pub fn with_filters(mut self, category: CategoryFilter, tone: Tone) -> Self {
        self.category = category;
        self.tone = tone;
        self
    }

    pub fn run<R: BufRead, W: WriteColor>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{} books indexed. Type a description of what you want to read, or 'help'.",
            self.context.catalog.len()
        )?;

        loop {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
            write!(out, "bookrec>")?;
            out.reset()?;
            write!(out, " ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                "exit" | "quit" | "q" => break,
                "help" => show_help(out)?,
                ":categories" => {
                    for category in self.context.catalog.category_choices() {
                        writeln!(out, "  {}", category)?;
                    }
                }
                ":tones" => {
                    for tone in Tone::CHOICES {
                        writeln!(out, "  {}", tone)?;
                    }
                }
                ":filters" => self.show_filters(out)?,
                _ => {
                    if let Some(label) = line.strip_prefix(":category") {
                        self.set_category(label.trim(), out)?;
                    } else if let Some(label) = line.strip_prefix(":tone") {
                        self.set_tone(label.trim(), out)?;
                    } else if line.starts_with(':') {
                        print_warning(out, &format!("Unknown command {}. Type 'help'.", line))?;
                    } else {
                        self.query(line, out)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn set_category<W: WriteColor>(&mut self, label: &str, out: &mut W) -> io::Result<()> {
        let filter = CategoryFilter::parse(label);
        if let CategoryFilter::Only(name) = &filter {
            if !self.context.catalog.categories().contains(name) {
                return print_warning(
                    out,
                    &format!("No category named {:?}. See :categories.", name),
                );
            }
        }
        self.category = filter;
        self.show_filters(out)
    }

    /// Unknown tones fall back to no tone sorting.
    fn set_tone<W: WriteColor>(&mut self, label: &str, out: &mut W) -> io::Result<()> {
        self.tone = match label.parse::<Tone>() {
            Ok(tone) => tone,
            Err(e) => {
                print_warning(out, &format!("{}; tone sorting disabled", e))?;
                Tone::All
            }
        };
        self.show_filters(out)
    }

    fn show_filters<W: WriteColor>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "category: {}, tone: {}", self.category, self.tone)
    }

    fn query<W: WriteColor>(&self, query: &str, out: &mut W) -> io::Result<()> {
        let filters = QueryFilters {
            query: query.to_string(),
            category: self.category.clone(),
            tone: self.tone,
        };

        // Failures are reported per request; the session carries on.
        match self
            .context
            .execute_recommend(&filters)
            .and_then(|response| response.ensure_results().map_err(Error::from))
        {
            Ok(response) => print_response(out, &response),
            Err(Error::NoResults(e)) => print_warning(out, &e.to_string()),
            Err(e) => {
                warn!("Recommendation failed: {}", e);
                print_error(out, &format!("Recommendation failed: {}", e))
            }
        }
    }
}

/// Numbered captions with their cover URLs.
pub fn print_response<W: WriteColor>(out: &mut W, response: &RecommendResponse) -> io::Result<()> {
    for (i, rec) in response.results.iter().enumerate() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(out, "{:>3}.", i + 1)?;
        out.reset()?;
        writeln!(out, " {}", rec.caption)?;

        out.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(out, "     {}", rec.image_url)?;
        out.reset()?;
    }

    out.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(
        out,
        "{} results from {} candidates in {}ms",
        response.stats.num_results, response.stats.num_candidates, response.stats.total_time_ms
    )?;
    out.reset()
}

pub fn print_warning<W: WriteColor>(out: &mut W, message: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    writeln!(out, "{}", message)?;
    out.reset()
}

fn print_error<W: WriteColor>(out: &mut W, message: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
    writeln!(out, "{}", message)?;
    out.reset()
}

fn show_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  <text>              Recommend books matching the description")?;
    writeln!(out, "  :category <label>   Filter by category (All to clear)")?;
    writeln!(out, "  :tone <label>       Sort by tone (All to clear)")?;
    writeln!(out, "  :categories         List categories")?;
    writeln!(out, "  :tones              List tones")?;
    writeln!(out, "  :filters            Show the active filters")?;
    writeln!(out, "  help                Show this help")?;
    writeln!(out, "  exit, quit, q       Leave the shell")
}
