//! # Terminal Front End
//!
//! A line-oriented register for the shop counter (or an SSH session).
//! Every line is parsed into a [`Command`], routed to the matching function
//! in [`crate::commands`], and the result rendered as text.
//!
//! ```text
//! Shopfront [Tab 1] > scan RICE-5KG
//!   1  Basmati Rice 5kg            x1  @ 950.00        950.00
//!      Total 950.00 · Due 950.00 · Tendered 0.00
//!      Walk-in customers must pay the full amount
//! Shopfront [Tab 1] > tender 1000
//! Shopfront [Tab 1] > change 50
//! Shopfront [Tab 1] > pay
//!   ? 0.00 change not returned ... type `confirm` to go ahead
//! ```
//!
//! Tabs, lines and parked orders are addressed by their 1-based position
//! as listed, or by id.

use std::fmt::Write as _;
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use shopfront_core::{ConfirmationKind, Invoice, ReconciliationOutcome};

use crate::checkout::CheckoutOutcome;
use crate::commands::cart::CartResponse;
use crate::commands::tabs::TabsResponse;
use crate::commands::{cart, checkout, customer, payment, tabs};
use crate::error::ApiError;
use crate::Register;

const HELP: &str = "\
Tabs      tabs | new | switch <tab> | close <tab> | move <tab> [<before>]
Parking   park | unpark <n> | discard <n>
Cart      scan <sku> | find <text> | qty <line> <n> | rm <line> | discount <amt> | clear
Customer  customers <text> | attach <id> | detach | newcust <name> [phone]
Payment   method <cash|upi|card|credit_due> | tender <amt> | change <amt> | credit <amt>
          split cash=<amt> upi=<amt> ...
Checkout  pay | confirm | invoice <number>
Other     cart | help | quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Tabs,
    NewTab,
    SwitchTab(String),
    CloseTab(String),
    MoveTab { tab: String, before: Option<String> },
    Park,
    Unpark(String),
    DiscardParked(String),
    Cart,
    Scan(String),
    Find(String),
    Quantity { line: String, quantity: i64 },
    Remove(String),
    Discount(String),
    Clear,
    Customers(String),
    Attach(String),
    Detach,
    NewCustomer { name: String, phone: Option<String> },
    Method(String),
    Tender(String),
    Change(String),
    Credit(String),
    Split(String),
    Pay,
    Confirm,
    Invoice(String),
    Quit,
}

impl FromStr for Command {
    type Err = ApiError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let arg = |what: &str| {
            if rest.is_empty() {
                Err(ApiError::validation(format!("{} needs {}", word, what)))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "tabs" => Command::Tabs,
            "new" => Command::NewTab,
            "switch" | "tab" => Command::SwitchTab(arg("a tab")?),
            "close" => Command::CloseTab(arg("a tab")?),
            "move" => {
                let mut parts = arg("a tab")?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
                    .into_iter();
                let tab = parts.next().unwrap_or_default();
                Command::MoveTab {
                    tab,
                    before: parts.next(),
                }
            }
            "park" | "hold" => Command::Park,
            "unpark" => Command::Unpark(arg("a parked order")?),
            "discard" => Command::DiscardParked(arg("a parked order")?),
            "cart" | "" => Command::Cart,
            "scan" | "add" => Command::Scan(arg("a SKU")?),
            "find" => Command::Find(rest.to_string()),
            "qty" => {
                let args = arg("a line and a quantity")?;
                let (line, qty) = args
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| ApiError::validation("qty needs a line and a quantity"))?;
                let quantity = qty
                    .parse()
                    .map_err(|_| ApiError::validation(format!("'{}' is not a quantity", qty)))?;
                Command::Quantity {
                    line: line.trim().to_string(),
                    quantity,
                }
            }
            "rm" | "remove" => Command::Remove(arg("a line")?),
            "discount" => Command::Discount(arg("an amount")?),
            "clear" => Command::Clear,
            "customers" => Command::Customers(rest.to_string()),
            "attach" => Command::Attach(arg("a customer id")?),
            "detach" => Command::Detach,
            "newcust" => {
                let args = arg("a name")?;
                // A trailing run of digits is the phone number
                match args.rsplit_once(char::is_whitespace) {
                    Some((name, phone)) if phone.trim_start_matches('+').chars().all(|c| c.is_ascii_digit()) => {
                        Command::NewCustomer {
                            name: name.trim().to_string(),
                            phone: Some(phone.to_string()),
                        }
                    }
                    _ => Command::NewCustomer {
                        name: args,
                        phone: None,
                    },
                }
            }
            "method" => Command::Method(arg("a payment method")?),
            "tender" | "paid" => Command::Tender(arg("an amount")?),
            "change" => Command::Change(arg("an amount")?),
            "credit" => Command::Credit(arg("an amount")?),
            "split" => Command::Split(arg("tenders like cash=200 upi=300")?),
            "pay" | "checkout" => Command::Pay,
            "confirm" | "yes" => Command::Confirm,
            "invoice" => Command::Invoice(arg("an invoice number")?),
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(ApiError::validation(format!(
                    "Unknown command '{}', type help",
                    other
                )))
            }
        };
        Ok(command)
    }
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Terminal session over a running register.
pub struct Terminal<'a> {
    register: &'a Register,

    /// Confirmation shown after the last `pay`, for `confirm`
    pending: Option<ConfirmationKind>,
}

impl<'a> Terminal<'a> {
    pub fn new(register: &'a Register) -> Self {
        Terminal {
            register,
            pending: None,
        }
    }

    pub fn prompt(&self) -> String {
        let label = self
            .register
            .state
            .with_manager(|m| m.active().display_name.clone());
        format!("{} [{}] > ", self.register.config.store_name, label)
    }

    /// Parses and runs one line, returning what to print.
    pub async fn handle_line(&mut self, line: &str) -> (Flow, String) {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => return (Flow::Continue, format!("  ! {}\n", e.message)),
        };
        debug!(?command, "Terminal command");

        if command == Command::Quit {
            return (Flow::Quit, String::new());
        }
        match self.execute(command).await {
            Ok(out) => (Flow::Continue, out),
            Err(e) => (Flow::Continue, format!("  ! {}\n", e.message)),
        }
    }

    async fn execute(&mut self, command: Command) -> Result<String, ApiError> {
        let reg = self.register;
        let state = &reg.state;
        let db = reg.db.as_ref();

        // Any edit invalidates a confirmation the cashier has not acted on
        if !matches!(command, Command::Confirm | Command::Help | Command::Cart | Command::Tabs) {
            self.pending = None;
        }

        let out = match command {
            Command::Help => format!("{}\n", HELP),
            Command::Tabs => render_tabs(&tabs::list_tabs(state)),
            Command::NewTab => {
                render_tabs(&tabs::open_tab(state, reg.config.default_payment_method))
            }
            Command::SwitchTab(tab) => {
                let id = self.resolve_tab(&tab);
                tabs::switch_tab(state, &id)?;
                render_cart(&cart::get_cart(state))
            }
            Command::CloseTab(tab) => render_tabs(&tabs::close_tab(state, &self.resolve_tab(&tab))?),
            Command::MoveTab { tab, before } => {
                let id = self.resolve_tab(&tab);
                let before = before.map(|b| self.resolve_tab(&b));
                render_tabs(&tabs::reorder_tab(state, &id, before.as_deref())?)
            }
            Command::Park => render_tabs(&tabs::park_active(state)?),
            Command::Unpark(n) => {
                tabs::retrieve_parked(state, &self.resolve_parked(&n))?;
                render_cart(&cart::get_cart(state))
            }
            Command::DiscardParked(n) => {
                render_tabs(&tabs::discard_parked(state, &self.resolve_parked(&n))?)
            }
            Command::Cart => render_cart(&cart::get_cart(state)),
            Command::Scan(sku) => render_cart(&cart::scan_item(db, state, &sku).await?),
            Command::Find(query) => {
                let mut out = String::new();
                for item in cart::search_items(db, &query, None).await? {
                    let _ = writeln!(
                        out,
                        "  {:<12} {:<28} {:>10}  stock {}",
                        item.sku,
                        item.name,
                        item.unit_price.to_string(),
                        item.stock_qty
                    );
                }
                if out.is_empty() {
                    out.push_str("  no matching items\n");
                }
                out
            }
            Command::Quantity { line, quantity } => {
                let item_id = self.resolve_line(&line);
                render_cart(&cart::set_quantity(state, &item_id, quantity)?)
            }
            Command::Remove(line) => {
                let item_id = self.resolve_line(&line);
                render_cart(&cart::remove_item(state, &item_id)?)
            }
            Command::Discount(amount) => render_cart(&cart::set_discount(state, &amount)?),
            Command::Clear => render_cart(&cart::clear_cart(state)),
            Command::Customers(query) => {
                let mut out = String::new();
                for c in customer::search_customers(db, &query).await? {
                    let _ = writeln!(
                        out,
                        "  {}  {:<24} {:<14} dues {}",
                        c.id,
                        c.name,
                        c.phone.as_deref().unwrap_or("-"),
                        c.dues
                    );
                }
                if out.is_empty() {
                    out.push_str("  no matching customers\n");
                }
                out
            }
            Command::Attach(id) => render_cart(&customer::attach_customer(db, state, &id).await?),
            Command::Detach => render_cart(&customer::detach_customer(state)?),
            Command::NewCustomer { name, phone } => render_cart(
                &customer::create_customer(db, state, &name, phone.as_deref()).await?,
            ),
            Command::Method(method) => render_cart(&payment::set_payment_method(state, &method)?),
            Command::Tender(amount) => render_cart(&payment::set_tendered(state, &amount)?),
            Command::Change(amount) => render_cart(&payment::set_change_returned(state, &amount)?),
            Command::Credit(amount) => render_cart(&payment::set_credit(state, &amount)?),
            Command::Split(tenders) => {
                let tenders = payment::parse_tenders(&tenders)?;
                render_cart(&payment::apply_split(state, &tenders)?)
            }
            Command::Pay => self.pay(None).await?,
            Command::Confirm => match self.pending.take() {
                Some(kind) => self.pay(Some(kind)).await?,
                None => "  nothing to confirm, type pay first\n".to_string(),
            },
            Command::Invoice(number) => render_invoice(&checkout::get_invoice(db, &number).await?),
            Command::Quit => String::new(),
        };
        Ok(out)
    }

    async fn pay(&mut self, ack: Option<ConfirmationKind>) -> Result<String, ApiError> {
        let reg = self.register;
        let outcome = checkout::checkout(&reg.finalizer, &reg.state, ack).await?;
        Ok(match outcome {
            CheckoutOutcome::Completed(invoice) => render_invoice(&invoice),
            CheckoutOutcome::NeedsConfirmation(kind) => {
                self.pending = Some(kind);
                format!("  ? {}. Type confirm to go ahead.\n", kind)
            }
            CheckoutOutcome::Rejected(reason) => format!("  ✗ {}\n", reason),
        })
    }

    /// Position in the tab strip, or an id as typed.
    fn resolve_tab(&self, reference: &str) -> String {
        self.register.state.with_manager(|m| {
            by_position(reference, m.sessions().iter().map(|s| s.id.as_str()))
        })
    }

    fn resolve_parked(&self, reference: &str) -> String {
        self.register.state.with_manager(|m| {
            by_position(reference, m.parked().iter().map(|p| p.id.as_str()))
        })
    }

    /// Line position, SKU, or item id.
    fn resolve_line(&self, reference: &str) -> String {
        self.register.state.with_manager(|m| {
            let lines = &m.active().lines;
            lines
                .iter()
                .find(|l| l.sku.eq_ignore_ascii_case(reference))
                .map(|l| l.item_id.clone())
                .unwrap_or_else(|| by_position(reference, lines.iter().map(|l| l.item_id.as_str())))
        })
    }
}

fn by_position<'a>(reference: &str, mut ids: impl Iterator<Item = &'a str>) -> String {
    reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| ids.nth(index))
        .unwrap_or(reference)
        .to_string()
}

// =============================================================================
// Rendering
// =============================================================================

fn render_cart(cart: &CartResponse) -> String {
    let s = &cart.session;
    let p = &cart.settlement;
    let mut out = String::new();

    let who = s
        .customer
        .as_ref()
        .map(|c| format!("{} (dues {})", c.name, c.dues))
        .unwrap_or_else(|| "walk-in".to_string());
    let _ = writeln!(out, "  {} · {} · {}", s.display_name, who, s.payment_method);

    for (i, line) in s.lines.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}  {:<28} x{:<3} @ {:>9} {:>11}",
            i + 1,
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string()
        );
    }

    let _ = writeln!(
        out,
        "      Subtotal {} · Discount {} · Total {} · Credit {} · Due {}",
        p.subtotal, p.discount, p.total, p.credit_applied, p.amount_due
    );
    let _ = writeln!(
        out,
        "      Tendered {} · Change owed {} · Change given {}",
        p.amount_tendered, p.change_required, p.change_returned
    );
    for tender in &s.tenders {
        let _ = writeln!(out, "        {} {}", tender.method, tender.amount);
    }

    let preview = match cart.preview {
        ReconciliationOutcome::Proceed => "ready to pay".to_string(),
        ReconciliationOutcome::NeedsConfirmation(kind) => format!("needs confirmation: {}", kind),
        ReconciliationOutcome::Reject(reason) => reason.to_string(),
    };
    let _ = writeln!(out, "      {}", preview);
    out
}

fn render_tabs(tabs: &TabsResponse) -> String {
    let mut out = String::new();
    for (i, tab) in tabs.tabs.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {} {:>2}  {:<8} {:<20} {:>3} lines {:>11}",
            if tab.active { "*" } else { " " },
            i + 1,
            tab.label,
            tab.customer_name.as_deref().unwrap_or("walk-in"),
            tab.item_count,
            tab.total.to_string()
        );
    }
    if !tabs.parked.is_empty() {
        out.push_str("  parked:\n");
        for (i, parked) in tabs.parked.iter().enumerate() {
            let _ = writeln!(
                out,
                "    {:>2}  {:<8} {:<20} {:>11}  {}",
                i + 1,
                parked.label,
                parked.customer_name.as_deref().unwrap_or("walk-in"),
                parked.total.to_string(),
                parked.parked_at.format("%H:%M")
            );
        }
    }
    out
}

fn render_invoice(invoice: &Invoice) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  ✓ {}  {}",
        invoice.invoice_number,
        invoice.created_at.format("%Y-%m-%d %H:%M")
    );
    for line in &invoice.lines {
        let _ = writeln!(
            out,
            "      {:<28} x{:<3} {:>11}",
            line.name,
            line.quantity,
            line.line_total.to_string()
        );
    }
    let _ = writeln!(
        out,
        "      Total {} · Paid {} ({}) · Change {} · Credit used {}",
        invoice.total_amount,
        invoice.paid_amount,
        invoice.payment_method,
        invoice.change_returned,
        invoice.credit_applied
    );
    out
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run(register: &Register) -> std::io::Result<()> {
    let mut terminal = Terminal::new(register);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(format!("{} register. Type help for commands.\n", register.config.store_name).as_bytes())
        .await?;

    loop {
        stdout.write_all(terminal.prompt().as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let (flow, out) = terminal.handle_line(&line).await;
        stdout.write_all(out.as_bytes()).await?;
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use shopfront_core::Money;
    use shopfront_db::{Database, DbConfig, NewItem};

    use crate::checkout::CheckoutFinalizer;
    use crate::state::{AppConfig, RegisterState};

    #[test]
    fn test_parse_commands() {
        assert_eq!("scan RICE-5KG".parse::<Command>().unwrap(), Command::Scan("RICE-5KG".into()));
        assert_eq!(
            "qty 2 5".parse::<Command>().unwrap(),
            Command::Quantity {
                line: "2".into(),
                quantity: 5
            }
        );
        assert_eq!(
            "move 3 1".parse::<Command>().unwrap(),
            Command::MoveTab {
                tab: "3".into(),
                before: Some("1".into())
            }
        );
        assert_eq!(
            "newcust Asha Verma 9811122233".parse::<Command>().unwrap(),
            Command::NewCustomer {
                name: "Asha Verma".into(),
                phone: Some("9811122233".into())
            }
        );
        assert_eq!(
            "newcust Asha Verma".parse::<Command>().unwrap(),
            Command::NewCustomer {
                name: "Asha Verma".into(),
                phone: None
            }
        );
        assert_eq!("".parse::<Command>().unwrap(), Command::Cart);

        assert!("scan".parse::<Command>().is_err());
        assert!("qty 2 many".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[test]
    fn test_by_position() {
        let ids = ["a", "b", "c"];
        assert_eq!(by_position("2", ids.iter().copied()), "b");
        assert_eq!(by_position("9", ids.iter().copied()), "9");
        assert_eq!(by_position("0", ids.iter().copied()), "0");
        assert_eq!(by_position("c", ids.iter().copied()), "c");
    }

    async fn register() -> Register {
        let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
        db.items()
            .insert(&NewItem {
                sku: "TEA-500G".to_string(),
                name: "Black Tea 500g".to_string(),
                unit_price: Money::from_cents(32000),
                stock_qty: 5,
                unit: "pkt".to_string(),
            })
            .await
            .unwrap();
        Register {
            config: AppConfig {
                store_name: "Test".to_string(),
                ..AppConfig::default()
            },
            finalizer: CheckoutFinalizer::new(db.clone()),
            db,
            state: RegisterState::in_memory(),
        }
    }

    #[tokio::test]
    async fn test_walk_in_sale_with_unreturned_change() {
        let register = register().await;
        let mut terminal = Terminal::new(&register);
        assert_eq!(terminal.prompt(), "Test [Tab 1] > ");

        let (_, out) = terminal.handle_line("scan TEA-500G").await;
        assert!(out.contains("Black Tea 500g"));

        terminal.handle_line("tender 400").await;
        let (_, out) = terminal.handle_line("pay").await;
        assert!(out.contains("Type confirm"), "{}", out);

        let (_, out) = terminal.handle_line("confirm").await;
        assert!(out.contains("INV-000001"), "{}", out);

        let (_, out) = terminal.handle_line("confirm").await;
        assert!(out.contains("nothing to confirm"));

        let (_, out) = terminal.handle_line("invoice INV-000001").await;
        assert!(out.contains("Paid 400.00"), "{}", out);
    }

    #[tokio::test]
    async fn test_edit_clears_pending_confirmation() {
        let register = register().await;
        let mut terminal = Terminal::new(&register);

        terminal.handle_line("scan TEA-500G").await;
        terminal.handle_line("tender 400").await;
        terminal.handle_line("pay").await;
        terminal.handle_line("change 80").await;

        let (_, out) = terminal.handle_line("confirm").await;
        assert!(out.contains("nothing to confirm"));

        let (_, out) = terminal.handle_line("pay").await;
        assert!(out.contains("INV-000001"), "{}", out);
    }

    #[tokio::test]
    async fn test_errors_are_printed_not_fatal() {
        let register = register().await;
        let mut terminal = Terminal::new(&register);

        let (flow, out) = terminal.handle_line("scan NOPE").await;
        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("  ! "));

        let (flow, _) = terminal.handle_line("quit").await;
        assert_eq!(flow, Flow::Quit);
    }
}
