use crate::domain::package::Package;
use crate::domain::ports::{PortalView, StatusKind};
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Renders package cards and status lines as plain text.
///
/// A terminal cannot take a line back, so hiding the status region only
/// forgets the current message.
pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lines(&self, lines: &[String]) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let mut result = Ok(());
        for line in lines {
            result = writeln!(out, "{line}");
            if result.is_err() {
                break;
            }
        }
        if let Err(e) = result.and_then(|_| out.flush()) {
            warn!("failed to write to terminal: {}", e);
        }
    }
}

/// Formats one package the way the portal's card shows it.
pub fn package_card(package: &Package) -> Vec<String> {
    vec![
        format!("[{}] {}", package.id, package.name),
        format!("    Price: {}", package.price_label()),
        format!("    Speed: {}", package.speed_label()),
        format!("    Duration: {}", package.duration_label()),
    ]
}

impl<W: Write + Send> PortalView for TerminalView<W> {
    fn render_packages(&self, packages: &[Package]) {
        if packages.is_empty() {
            self.write_lines(&["No packages available.".to_string()]);
            return;
        }
        let lines: Vec<String> = packages
            .iter()
            .flat_map(|package| package_card(package).into_iter().chain([String::new()]))
            .collect();
        self.write_lines(&lines);
    }

    fn show_status(&self, message: &str, kind: StatusKind) {
        let tag = match kind {
            StatusKind::Info => "status",
            StatusKind::Error => "error",
        };
        self.write_lines(&[format!("[{tag}] {message}")]);
    }

    fn hide_status(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn daily() -> Package {
        Package {
            id: 3,
            name: "Daily Unlimited".to_string(),
            price: dec!(50.00),
            download_bandwidth: dec!(5),
            upload_bandwidth: dec!(2),
            duration_minutes: None,
            duration_hours: None,
            duration_days: Some(1),
        }
    }

    #[test]
    fn test_renders_package_cards() {
        let view = TerminalView::new(Vec::new());
        view.render_packages(&[daily()]);
        let output = String::from_utf8(view.into_inner()).unwrap();

        assert!(output.contains("[3] Daily Unlimited"));
        assert!(output.contains("Price: KSH 50.00"));
        assert!(output.contains("Speed: 5Mbps down/2Mbps up"));
        assert!(output.contains("Duration: 1 days"));
    }

    #[test]
    fn test_status_lines_are_tagged() {
        let view = TerminalView::new(Vec::new());
        view.show_status("Initiating payment... Please wait.", StatusKind::Info);
        view.show_status("Payment failed. Please try again.", StatusKind::Error);
        view.hide_status();
        let output = String::from_utf8(view.into_inner()).unwrap();

        assert_eq!(
            output,
            "[status] Initiating payment... Please wait.\n[error] Payment failed. Please try again.\n"
        );
    }

    #[test]
    fn test_empty_catalog() {
        let view = TerminalView::new(Vec::new());
        view.render_packages(&[]);
        let output = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(output, "No packages available.\n");
    }
}
