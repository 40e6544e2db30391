use crate::cli::RosterArgs;
use matchdesk::error::AppError;
use matchdesk::workflows::registration::{
    CategoryRegistry, CsvLedger, PaymentStatus, RegistrationLedger, SlotKind,
};

/// Per-category fill summary for the operator report.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RosterLine {
    pub(crate) category: String,
    pub(crate) capacity: u32,
    pub(crate) main: u32,
    pub(crate) waitlisted: u32,
    pub(crate) confirmed: u32,
}

pub(crate) fn run_roster(args: RosterArgs) -> Result<(), AppError> {
    let registry = CategoryRegistry::standard();
    let ledger = CsvLedger::open(args.ledger_csv)?;
    let lines = roster_lines(&registry, &ledger)?;
    render_roster(&lines);
    Ok(())
}

pub(crate) fn roster_lines<L>(
    registry: &CategoryRegistry,
    ledger: &L,
) -> Result<Vec<RosterLine>, AppError>
where
    L: RegistrationLedger,
{
    let mut lines = Vec::new();
    for category in registry.categories() {
        let rows = ledger.in_category(&category.name).map_err(AppError::from)?;
        let main = rows.iter().filter(|row| row.slot == SlotKind::Main).count() as u32;
        let waitlisted = rows
            .iter()
            .filter(|row| row.slot == SlotKind::Waitlist)
            .count() as u32;
        let confirmed = rows
            .iter()
            .filter(|row| row.payment == PaymentStatus::Confirmed)
            .count() as u32;

        lines.push(RosterLine {
            category: category.name.clone(),
            capacity: category.capacity,
            main,
            waitlisted,
            confirmed,
        });
    }
    Ok(lines)
}

fn render_roster(lines: &[RosterLine]) {
    println!("Category roster");
    for line in lines {
        println!(
            "- {}: {}/{} main ({} paid), {} waitlisted",
            line.category, line.main, line.capacity, line.confirmed, line.waitlisted
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryLedger;
    use chrono::Utc;
    use matchdesk::workflows::registration::NewRegistration;

    fn new_registration(category: &str, handle: &str, slot: SlotKind) -> NewRegistration {
        NewRegistration {
            submitted_at: Utc::now(),
            category: category.to_string(),
            player_name: "Anna Petrova".to_string(),
            partner_name: None,
            phone: "+7 900 000-00-00".to_string(),
            handle: handle.to_string(),
            slot,
        }
    }

    #[test]
    fn roster_lines_count_slots_and_confirmed_payments() {
        let registry = CategoryRegistry::standard();
        let ledger = InMemoryLedger::default();
        let first = ledger
            .append(new_registration("Ladies Amateur", "@anna", SlotKind::Main))
            .expect("append");
        ledger
            .append(new_registration(
                "Ladies Amateur",
                "@vera",
                SlotKind::Waitlist,
            ))
            .expect("append");
        ledger
            .update_payment(
                first.id,
                PaymentStatus::Unpaid,
                PaymentStatus::PendingReview,
                Some("receipt-1"),
            )
            .expect("receipt");
        ledger
            .update_payment(
                first.id,
                PaymentStatus::PendingReview,
                PaymentStatus::Confirmed,
                None,
            )
            .expect("confirm");

        let lines = roster_lines(&registry, &ledger).expect("lines build");
        let ladies = lines
            .iter()
            .find(|line| line.category == "Ladies Amateur")
            .expect("category listed");
        assert_eq!(ladies.capacity, 12);
        assert_eq!(ladies.main, 1);
        assert_eq!(ladies.waitlisted, 1);
        assert_eq!(ladies.confirmed, 1);

        let empty = lines
            .iter()
            .find(|line| line.category == "Mixed Master")
            .expect("category listed");
        assert_eq!(empty.main, 0);
    }
}
