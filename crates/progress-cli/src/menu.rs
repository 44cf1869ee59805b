//! The interactive numbered menu.
//!
//! Every action is a one-shot operation that returns to the menu root. Input
//! mistakes are reported and the action is abandoned; store and publish
//! failures are printed as errors. Only Exit (or end of input) ends the loop.

use std::io::{BufRead, Write};

use anyhow::Result;
use progress_core::tracker::{DeleteOutcome, Tracker, DELETE_CONFIRMATION};
use progress_core::types::{ItemId, Stamp};
use tracing::warn;

use crate::output::write_table;
use crate::prompt::{parse_percentage, parse_selection, Prompter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    WriteProgress,
    CreateItem,
    DeleteItem,
    ShowUrls,
    UpdateAll,
    Exit,
}

impl MenuAction {
    pub fn all() -> &'static [MenuAction] {
        &[
            MenuAction::WriteProgress,
            MenuAction::CreateItem,
            MenuAction::DeleteItem,
            MenuAction::ShowUrls,
            MenuAction::UpdateAll,
            MenuAction::Exit,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::WriteProgress => "Write Progress",
            MenuAction::CreateItem => "Create Item",
            MenuAction::DeleteItem => "Delete Item",
            MenuAction::ShowUrls => "Show Published URLs",
            MenuAction::UpdateAll => "Update All Pages",
            MenuAction::Exit => "Exit",
        }
    }

    pub fn from_choice(raw: &str) -> Option<MenuAction> {
        let n: usize = raw.trim().parse().ok()?;
        Self::all().get(n.checked_sub(1)?).copied()
    }
}

/// Whether the menu should keep going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    EndOfInput,
}

/// Outcome of asking the user to pick an item from a list.
enum Pick {
    Item(ItemId),
    /// Input was not a valid choice; already reported.
    Rejected,
}

/// Unwrap a prompt answer, ending the session at end of input.
macro_rules! answer {
    ($expr:expr) => {
        match $expr? {
            Some(line) => line,
            None => return Ok(Flow::EndOfInput),
        }
    };
}

pub struct Menu<'a, R, W> {
    tracker: &'a Tracker,
    io: Prompter<R, W>,
    open_after_publish: bool,
    opener: fn(&str) -> bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(tracker: &'a Tracker, input: R, out: W) -> Self {
        Self {
            tracker,
            io: Prompter::new(input, out),
            open_after_publish: false,
            opener: crate::browser::open_url,
        }
    }

    pub fn open_after_publish(mut self, enabled: bool) -> Self {
        self.open_after_publish = enabled;
        self
    }

    /// Replace the browser launcher (used to keep tests off the real desktop).
    pub fn with_opener(mut self, opener: fn(&str) -> bool) -> Self {
        self.opener = opener;
        self
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu()?;
            let Some(choice) = self
                .io
                .ask(&format!("Enter choice [1-{}]: ", MenuAction::all().len()))?
            else {
                break;
            };

            let action = match MenuAction::from_choice(&choice) {
                Some(MenuAction::Exit) => {
                    self.io.say("Goodbye!")?;
                    break;
                }
                Some(action) => action,
                None => {
                    self.io.say("Invalid option. Please try again.")?;
                    continue;
                }
            };

            match self.dispatch(action) {
                Ok(Flow::Continue) => {}
                Ok(Flow::EndOfInput) => break,
                Err(e) => {
                    warn!(action = action.label(), error = format!("{e:#}"), "action failed");
                    self.io.say(&format!("error: {e:#}"))?;
                }
            }
        }
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        self.io.say("")?;
        self.io.say("Choose an action:")?;
        for (i, action) in MenuAction::all().iter().enumerate() {
            self.io.say(&format!("{}. {}", i + 1, action.label()))?;
        }
        Ok(())
    }

    fn dispatch(&mut self, action: MenuAction) -> Result<Flow> {
        match action {
            MenuAction::WriteProgress => self.write_progress(),
            MenuAction::CreateItem => self.create_item(),
            MenuAction::DeleteItem => self.delete_item(),
            MenuAction::ShowUrls => self.show_urls(),
            MenuAction::UpdateAll => self.update_all(),
            MenuAction::Exit => Ok(Flow::Continue),
        }
    }

    /// List `ids` and read a 1-based choice. `None` is end of input.
    fn choose_item(
        &mut self,
        heading: &str,
        ids: &[ItemId],
        question: &str,
    ) -> Result<Option<Pick>> {
        self.io.say(heading)?;
        for (i, id) in ids.iter().enumerate() {
            self.io.say(&format!("{}. {id}", i + 1))?;
        }
        let Some(raw) = self.io.ask(question)? else {
            return Ok(None);
        };
        match parse_selection(&raw, ids.len()) {
            Ok(idx) => Ok(Some(Pick::Item(ids[idx].clone()))),
            Err(msg) => {
                self.io.say(&msg)?;
                Ok(Some(Pick::Rejected))
            }
        }
    }

    fn open(&mut self, url: &str) -> Result<()> {
        if (self.opener)(url) {
            self.io.say(&format!("Opened {url}"))?;
        } else {
            self.io.say(&format!("Could not open a browser. Visit {url}"))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn write_progress(&mut self) -> Result<Flow> {
        let ids = self.tracker.item_ids()?;
        if ids.is_empty() {
            self.io.say("No items found. Please create one first.")?;
            return Ok(Flow::Continue);
        }
        let picked = answer!(self.choose_item(
            "Select an existing item:",
            &ids,
            "Enter the number: "
        ));
        let Pick::Item(item) = picked else {
            return Ok(Flow::Continue);
        };

        let raw = answer!(self.io.ask("Enter current progress % (e.g., 72): "));
        let pct = match parse_percentage(&raw) {
            Ok(p) => p,
            Err(msg) => {
                self.io.say(&msg)?;
                return Ok(Flow::Continue);
            }
        };

        let url = self.tracker.write_progress(&item, pct, Stamp::now())?;
        self.io.say(&format!("Progress uploaded to: {url}"))?;
        if self.open_after_publish {
            self.open(&url)?;
        }
        Ok(Flow::Continue)
    }

    fn create_item(&mut self) -> Result<Flow> {
        let raw = answer!(self.io.ask("Enter new item id: "));
        let item = self.tracker.create_item(&raw, Stamp::now())?;
        self.io.say(&format!("Item {item} created."))?;
        Ok(Flow::Continue)
    }

    fn delete_item(&mut self) -> Result<Flow> {
        let ids = self.tracker.item_ids()?;
        if ids.is_empty() {
            self.io.say("No items to delete.")?;
            return Ok(Flow::Continue);
        }
        let picked = answer!(self.choose_item(
            "Existing items:",
            &ids,
            "Select item to delete: "
        ));
        let Pick::Item(item) = picked else {
            return Ok(Flow::Continue);
        };

        let confirmation = answer!(self.io.ask(&format!(
            "Type {DELETE_CONFIRMATION} to confirm deletion of '{item}': "
        )));
        match self.tracker.delete_item(&item, &confirmation)? {
            DeleteOutcome::Cancelled => self.io.say("Cancelled.")?,
            DeleteOutcome::Deleted { samples, objects } => self.io.say(&format!(
                "Item '{item}' deleted ({samples} samples, {objects} published objects)."
            ))?,
        }
        Ok(Flow::Continue)
    }

    fn show_urls(&mut self) -> Result<Flow> {
        let urls = self.tracker.published_urls()?;
        if urls.items.is_empty() {
            self.io.say("No items found.")?;
            return Ok(Flow::Continue);
        }

        self.io.say("")?;
        self.io.say("Published URLs:")?;
        let rows: Vec<Vec<String>> = urls
            .items
            .iter()
            .enumerate()
            .map(|(i, (id, url))| vec![(i + 1).to_string(), id.to_string(), url.clone()])
            .collect();
        write_table(self.io.out(), &["#", "Item", "URL"], &rows)?;
        self.io.say("")?;
        self.io.say(&format!("Homepage: {}", urls.homepage))?;

        let raw = answer!(self.io.ask(
            "Open in browser? Enter a number, 0 for the homepage, or press Enter to skip: "
        ));
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Flow::Continue);
        }
        let url = if raw == "0" {
            urls.homepage.clone()
        } else {
            match parse_selection(raw, urls.items.len()) {
                Ok(idx) => urls.items[idx].1.clone(),
                Err(msg) => {
                    self.io.say(&msg)?;
                    return Ok(Flow::Continue);
                }
            }
        };
        self.open(&url)?;
        Ok(Flow::Continue)
    }

    fn update_all(&mut self) -> Result<Flow> {
        let pages = self.tracker.update_all_pages()?;
        self.io.say(&format!(
            "Republished {pages} item page{} and the homepage.",
            if pages == 1 { "" } else { "s" }
        ))?;
        Ok(Flow::Continue)
    }
}
