//! Interactive confirmation for destructive operations
//!
//! Before something irreversible happens the affected assets are listed in a table
//! and the user is asked to confirm. The action only runs on an explicit yes.

use std::future::Future;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, Table};

/// A destructive action waiting for confirmation
#[derive(Debug, Clone, Copy)]
pub struct PendingAction<'a> {
    /// Display name of the action, e.g. `delete`
    pub action_name: &'a str,
    /// Display name of the asset kind, e.g. `bucket`
    pub asset_category: &'a str,
    /// Identifiers of every affected asset, in display order
    pub assets: &'a [String],
}

impl<'a> PendingAction<'a> {
    pub fn new(action_name: &'a str, asset_category: &'a str, assets: &'a [String]) -> Self {
        Self {
            action_name,
            asset_category,
            assets,
        }
    }
}

/// How a confirmation prompt was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Confirmed; carries the action's result
    Executed(T),
    /// Declined; nothing ran
    Aborted,
}

impl<T> Outcome<T> {
    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed(_))
    }
}

/// Renders warnings to `output` and reads answers from `input`
pub struct Confirmer<R, W> {
    input: R,
    output: W,
}

impl Confirmer<BufReader<Stdin>, Stdout> {
    /// Confirmer bound to the process terminal
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Show the warning, ask, and run `action` only if the answer is yes.
    ///
    /// An error from `action` is returned as is and no success message is printed.
    pub fn confirm_and_execute<T, F>(
        &mut self,
        pending: &PendingAction<'_>,
        action: F,
    ) -> Result<Outcome<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if !self.confirm(pending)? {
            self.report_aborted()?;
            return Ok(Outcome::Aborted);
        }

        let value = action()?;
        self.report_complete(pending)?;
        Ok(Outcome::Executed(value))
    }

    /// Async counterpart of [`Confirmer::confirm_and_execute`]
    pub async fn confirm_and_execute_async<T, F, Fut>(
        &mut self,
        pending: &PendingAction<'_>,
        action: F,
    ) -> Result<Outcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.confirm(pending)? {
            self.report_aborted()?;
            return Ok(Outcome::Aborted);
        }

        let value = action().await?;
        self.report_complete(pending)?;
        Ok(Outcome::Executed(value))
    }

    /// Render the warning and block for a yes/no answer
    pub fn confirm(&mut self, pending: &PendingAction<'_>) -> Result<bool> {
        self.show_warning(pending)?;
        let confirmed = self.ask("Do you want to continue")?;

        tracing::debug!(
            action = pending.action_name,
            category = pending.asset_category,
            assets = pending.assets.len(),
            confirmed,
            "Destructive action prompt answered"
        );

        Ok(confirmed)
    }

    fn show_warning(&mut self, pending: &PendingAction<'_>) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "⚠ Alert! This action has destructive behavior! ⚠")?;
        writeln!(self.output)?;
        writeln!(self.output, "The following assets will be purged")?;
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{} To Be {}",
            title_case(pending.asset_category),
            title_case(pending.action_name)
        )?;
        writeln!(self.output, "{}", asset_table(pending))?;
        writeln!(self.output)?;
        Ok(())
    }

    fn ask(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{} [y/N]: ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            // end of input counts as no
            writeln!(self.output)?;
            return Ok(false);
        }

        Ok(is_affirmative(&answer))
    }

    fn report_complete(&mut self, pending: &PendingAction<'_>) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{} complete", title_case(pending.action_name))?;
        writeln!(self.output)?;
        self.output.flush()
    }

    fn report_aborted(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "No Action Taken")?;
        writeln!(self.output)?;
        self.output.flush()
    }
}

/// Table with one row per affected asset: (category, identifier)
pub fn asset_table(pending: &PendingAction<'_>) -> Table {
    let category = title_case(pending.asset_category);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![category.clone(), format!("{} Name", category)]);

    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    for asset in pending.assets {
        table.add_row(vec![pending.asset_category, asset.as_str()]);
    }

    table
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Upper-case the first letter of every word and lower-case the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}
