// Selection engine: a read-evaluate-print loop over a `Paginator`.
//
// The interactive prompt renders the current page, reads one answer and
// either navigates, previews or returns the chosen item. The direct mode
// resolves a label given up front (or `*` for everything) by paging
// forward on its own.

use crate::error::{Error, Result};
use crate::models::Item;
use crate::paginator::{Page, Paginator};
use crate::ui::{dynamic_bars, Console};
use log::{debug, info};
use std::collections::{HashMap, HashSet, VecDeque};

/// Label that selects every item of the source.
pub const WILDCARD: &str = "*";

/// Per-command behaviour plugged into the engine.
pub trait PromptHooks<T> {
    /// Whether `preview NUMBER` is offered.
    fn supports_preview(&self) -> bool {
        false
    }

    fn preview(&self, _item: &T, _console: &mut dyn Console) -> Result<()> {
        Ok(())
    }

    /// Called when the very first page is empty. An error aborts the command.
    fn on_empty(&self) -> Result<()> {
        Ok(())
    }
}

/// Hooks with every default: no preview, empty results are not an error.
pub struct NoHooks;

impl<T> PromptHooks<T> for NoHooks {}

pub struct Selector<T, H> {
    title: String,
    paginator: Paginator<T>,
    hooks: H,
    choices: HashMap<String, T>,
    text_choices: String,
}

enum Action {
    Next,
    Previous,
}

impl<T, H> Selector<T, H>
where
    T: Item + Clone,
    H: PromptHooks<T>,
{
    pub fn new(title: impl Into<String>, paginator: Paginator<T>, hooks: H) -> Self {
        Selector {
            title: title.into(),
            paginator,
            hooks,
            choices: HashMap::new(),
            text_choices: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Resolve to item ids: interactively when `pick` is `None`, otherwise
    /// through the direct mode.
    pub fn resolve<C: Console>(
        mut self,
        pick: Option<&str>,
        console: &mut C,
    ) -> Result<Resolution<T, H>> {
        match pick {
            Some(label) => Ok(Resolution::Backlog(self.select(label))),
            None => Ok(Resolution::Chosen(
                self.prompt(console)?.map(|item| item.identity()),
            )),
        }
    }

    /// Run the interactive prompt. `None` when the source was empty or
    /// input ran out before a choice was made.
    pub fn prompt<C: Console>(&mut self, console: &mut C) -> Result<Option<T>> {
        if !self.start()? {
            return Ok(None);
        }

        loop {
            self.print_choices(console);
            let answer = match console.read_line("=>")? {
                Some(answer) => answer,
                None => {
                    debug!("selector: input exhausted without a choice");
                    return Ok(None);
                }
            };
            let answer = answer.trim();

            if self.hooks.supports_preview() && answer.starts_with("preview") {
                let label = answer["preview".len()..].trim();
                match self.choices.get(label) {
                    Some(item) => match self.hooks.preview(item, console) {
                        Err(e) if e.is_recoverable() => report(console, &e),
                        res => res?,
                    },
                    None => report(console, &Error::InvalidChoice(label.to_string())),
                }
                continue;
            }

            let action = if answer.starts_with("next") {
                Action::Next
            } else if answer.starts_with("previous") {
                Action::Previous
            } else {
                match self.choices.get(answer) {
                    Some(item) => {
                        debug!("selector: label {} chosen", answer);
                        return Ok(Some(item.clone()));
                    }
                    None => {
                        report(console, &Error::InvalidChoice(answer.to_string()));
                        continue;
                    }
                }
            };

            match self.load(action) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => report(console, &e),
                Err(e) => return Err(e),
            }
        }
    }

    /// Resolve `label` without prompting. The returned iterator pages
    /// forward until the label shows up, or for `*` yields every distinct
    /// item until the source runs out.
    pub fn select(self, label: &str) -> Backlog<T, H> {
        Backlog {
            selector: self,
            label: label.trim().to_string(),
            started: false,
            done: false,
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    // Load the first page. False when the source is empty.
    fn start(&mut self) -> Result<bool> {
        match self.load(Action::Next) {
            Ok(()) => Ok(true),
            Err(Error::Exhausted) => {
                info!("selector: \"{}\" has no results", self.title);
                self.hooks.on_empty()?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn load(&mut self, action: Action) -> Result<()> {
        let page = match action {
            Action::Next => self.paginator.next()?,
            Action::Previous => self.paginator.previous()?,
        };
        self.insert_choices(&page);
        Ok(())
    }

    fn insert_choices(&mut self, page: &Page<T>) {
        let mut text = String::new();
        for (pos, item) in page {
            self.choices.insert(pos.to_string(), item.clone());
            text.push_str(&format!("({}). {}\n", pos, item.display_string()));
        }
        self.text_choices = text;
    }

    fn print_choices<C: Console>(&self, console: &mut C) {
        let header = dynamic_bars(&self.title);
        let mut text = format!("{}\n{}\n{}\n", header, self.title, header);
        text.push_str(&self.text_choices);
        text.push('\n');
        text.push_str("type \"next\" to show next results\n");
        text.push_str("type \"previous\" to show previous results");
        if self.hooks.supports_preview() {
            text.push_str(
                "\ntype \"preview NUMBER\" to show more details about selected result. \
                 For example: \"preview 2\"",
            );
        }
        console.show(&text);
    }
}

fn report<C: Console + ?Sized>(console: &mut C, err: &Error) {
    console.show(&format!("\nError: {}\n", err));
}

/// Items resolved by the direct mode, deduplicated by identity in
/// first-seen order.
pub struct Backlog<T, H> {
    selector: Selector<T, H>,
    label: String,
    started: bool,
    done: bool,
    queue: VecDeque<T>,
    seen: HashSet<String>,
}

impl<T, H> Backlog<T, H>
where
    T: Item + Clone,
    H: PromptHooks<T>,
{
    fn wildcard(&self) -> bool {
        self.label == WILDCARD
    }

    fn advance(&mut self) -> Result<()> {
        if !self.started {
            self.started = true;
            if !self.selector.start()? {
                self.done = true;
                return Ok(());
            }
        } else {
            match self.selector.load(Action::Next) {
                Ok(()) => {}
                Err(Error::Exhausted) if self.wildcard() => {
                    self.done = true;
                    return Ok(());
                }
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            }
        }

        if self.wildcard() {
            let page = self.selector.paginator.current()?;
            self.queue.extend(page.into_iter().map(|(_, item)| item));
        } else if let Some(item) = self.selector.choices.get(&self.label) {
            debug!("selector: label {} found on page {}", self.label, self.selector.paginator.pos());
            self.queue.push_back(item.clone());
            self.done = true;
        }
        Ok(())
    }
}

impl<T, H> Iterator for Backlog<T, H>
where
    T: Item + Clone,
    H: PromptHooks<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(item) = self.queue.pop_front() {
                if self.seen.insert(item.identity().to_string()) {
                    return Some(Ok(item));
                }
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.advance() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Final answer of a selector, as item ids.
pub enum Resolution<T: Item, H> {
    Chosen(Option<T::Id>),
    Backlog(Backlog<T, H>),
}

impl<T, H> Iterator for Resolution<T, H>
where
    T: Item + Clone,
    H: PromptHooks<T>,
{
    type Item = Result<T::Id>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Resolution::Chosen(id) => id.take().map(Ok),
            Resolution::Backlog(backlog) => {
                backlog.next().map(|item| item.map(|item| item.identity()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::ScriptedConsole;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: &'static str,
        name: &'static str,
    }

    impl Item for Entry {
        type Id = &'static str;

        fn identity(&self) -> &'static str {
            self.id
        }

        fn display_string(&self) -> String {
            self.name.to_string()
        }
    }

    fn entries(ids: &[&'static str]) -> Vec<Entry> {
        ids.iter().map(|&id| Entry { id, name: id }).collect()
    }

    /// Source that counts how many items were pulled from it.
    fn counted(ids: &[&'static str], pulled: Rc<Cell<usize>>) -> Paginator<Entry> {
        let items = entries(ids);
        Paginator::from_items(
            items.into_iter().inspect(move |_| pulled.set(pulled.get() + 1)),
            2,
        )
    }

    #[derive(Default)]
    struct Recorder {
        empty_calls: Cell<usize>,
        previewed: RefCell<Vec<&'static str>>,
        fail_on_empty: bool,
        missing_viewer: bool,
    }

    impl PromptHooks<Entry> for &Recorder {
        fn supports_preview(&self) -> bool {
            true
        }

        fn preview(&self, item: &Entry, console: &mut dyn Console) -> Result<()> {
            console.show(&format!("preview of {}", item.name));
            self.previewed.borrow_mut().push(item.id);
            if self.missing_viewer {
                return Err(Error::MissingOptionalDependency("no viewer".into()));
            }
            Ok(())
        }

        fn on_empty(&self) -> Result<()> {
            self.empty_calls.set(self.empty_calls.get() + 1);
            if self.fail_on_empty {
                return Err(Error::EmptySource("nothing here".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn visible_label_is_returned_without_fetching() {
        let pulled = Rc::new(Cell::new(0));
        let mut selector = Selector::new("Results", counted(&["A", "B", "C", "D", "E"], pulled.clone()), NoHooks);
        let mut console = ScriptedConsole::new(&["next", "1"]);
        let chosen = selector.prompt(&mut console).unwrap();
        assert_eq!(chosen.map(|e| e.id), Some("B"));
        assert_eq!(pulled.get(), 4);
        assert!(console.output.contains("(2). C"));
        assert!(console.output.contains("(3). D"));
    }

    #[test]
    fn prompt_renders_header_and_instructions() {
        let mut selector = Selector::new("Results", Paginator::from_items(entries(&["A"]), 2), NoHooks);
        let mut console = ScriptedConsole::new(&["0"]);
        selector.prompt(&mut console).unwrap();
        let expected = "=======\nResults\n=======\n(0). A\n\n\
                        type \"next\" to show next results\n\
                        type \"previous\" to show previous results\n";
        assert_eq!(console.output, expected);
    }

    #[test]
    fn navigation_errors_are_recoverable() {
        let mut selector =
            Selector::new("Results", Paginator::from_items(entries(&["A", "B", "C"]), 2), NoHooks);
        let mut console = ScriptedConsole::new(&["previous", "next", "next", "bogus", "2"]);
        let chosen = selector.prompt(&mut console).unwrap();
        assert_eq!(chosen.map(|e| e.id), Some("C"));
        assert!(console.output.contains("Error: Choices are out of range, try again"));
        assert!(console.output.contains("Error: There are no more results"));
        assert!(console.output.contains("Error: Invalid choice, try again"));
        assert_eq!(console.prompts, 5);
    }

    #[test]
    fn previous_keeps_earlier_labels_selectable() {
        let mut selector = Selector::new(
            "Results",
            Paginator::from_items(entries(&["A", "B", "C", "D"]), 2),
            NoHooks,
        );
        let mut console = ScriptedConsole::new(&["next", "previous", "3"]);
        let chosen = selector.prompt(&mut console).unwrap();
        assert_eq!(chosen.map(|e| e.id), Some("D"));
    }

    #[test]
    fn preview_calls_hook_and_keeps_prompting() {
        let recorder = Recorder::default();
        let mut selector =
            Selector::new("Results", Paginator::from_items(entries(&["A", "B"]), 2), &recorder);
        let mut console = ScriptedConsole::new(&["preview 1", "preview 9", "0"]);
        let chosen = selector.prompt(&mut console).unwrap();
        assert_eq!(chosen.map(|e| e.id), Some("A"));
        assert_eq!(*recorder.previewed.borrow(), vec!["B"]);
        assert!(console.output.contains("preview of B"));
        assert!(console.output.contains("type \"preview NUMBER\""));
        assert!(console.output.contains("Error: Invalid choice, try again"));
    }

    #[test]
    fn preview_without_viewer_aborts_the_prompt() {
        let recorder = Recorder { missing_viewer: true, ..Default::default() };
        let mut selector =
            Selector::new("Results", Paginator::from_items(entries(&["A", "B"]), 2), &recorder);
        let mut console = ScriptedConsole::new(&["preview 0", "1"]);
        let err = selector.prompt(&mut console).unwrap_err();
        assert!(matches!(err, Error::MissingOptionalDependency(_)));
        assert_eq!(*recorder.previewed.borrow(), vec!["A"]);
        // the remaining answer is never read
        assert_eq!(console.prompts, 1);
    }

    #[test]
    fn preview_is_an_invalid_choice_without_support() {
        let mut selector = Selector::new("R", Paginator::from_items(entries(&["A"]), 2), NoHooks);
        let mut console = ScriptedConsole::new(&["preview 0"]);
        assert!(selector.prompt(&mut console).unwrap().is_none());
        assert!(console.output.contains("Error: Invalid choice"));
        assert!(!console.output.contains("preview NUMBER"));
    }

    #[test]
    fn empty_source_calls_hook_and_returns_nothing() {
        let recorder = Recorder::default();
        let mut selector = Selector::new("R", Paginator::from_items(Vec::<Entry>::new(), 2), &recorder);
        let mut console = ScriptedConsole::new(&["0"]);
        assert!(selector.prompt(&mut console).unwrap().is_none());
        assert_eq!(recorder.empty_calls.get(), 1);
        assert_eq!(console.prompts, 0);
    }

    #[test]
    fn empty_hook_error_is_fatal() {
        let recorder = Recorder { fail_on_empty: true, ..Default::default() };
        let selector = Selector::new("R", Paginator::from_items(Vec::<Entry>::new(), 2), &recorder);
        let mut results = selector.select("0");
        assert!(matches!(results.next(), Some(Err(Error::EmptySource(_)))));
        assert!(results.next().is_none());
    }

    #[test]
    fn direct_label_pages_forward() {
        let selector = Selector::new(
            "R",
            Paginator::from_items(entries(&["A", "B", "C", "D", "E"]), 2),
            NoHooks,
        );
        let found: Vec<_> = selector.select("4").map(|r| r.unwrap().id).collect();
        assert_eq!(found, vec!["E"]);
    }

    #[test]
    fn direct_label_missing_is_fatal() {
        let selector =
            Selector::new("R", Paginator::from_items(entries(&["A", "B", "C"]), 2), NoHooks);
        let results: Vec<_> = selector.select("7").collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::Exhausted)));
    }

    #[test]
    fn wildcard_yields_distinct_items_in_order() {
        let selector = Selector::new(
            "R",
            Paginator::from_items(entries(&["A", "B", "A", "C", "B", "D", "E"]), 2),
            NoHooks,
        );
        let ids: Vec<_> = selector.select(WILDCARD).map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn wildcard_is_lazy_over_infinite_sources() {
        let names = ["A", "B", "C"];
        let source = (0..).map(move |i| Entry { id: names[i % 3], name: "x" });
        let selector = Selector::new("R", Paginator::from_items(source, 2), NoHooks);
        let ids: Vec<_> = selector.select(WILDCARD).take(3).map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn resolution_maps_to_ids() {
        let selector =
            Selector::new("R", Paginator::from_items(entries(&["A", "B"]), 2), NoHooks);
        let mut console = ScriptedConsole::new(&["1"]);
        let ids: Vec<_> = selector
            .resolve(None, &mut console)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(ids, vec!["B"]);

        let selector =
            Selector::new("R", Paginator::from_items(entries(&["A", "B"]), 1), NoHooks);
        let ids = selector
            .resolve(Some("*"), &mut ScriptedConsole::new(&[]))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
