//! Reply texts

use crate::{
    participant::{InputMode, Participant, ParticipantId},
    registry::MissingAddressReport,
};

pub const REGISTRATION_CLOSED: &str =
    "Sorry, it is no longer possible to join the Secret Santa or change your details 😭.\n";

pub const NOT_REGISTERED: &str = "You are not among the Secret Santa participants 🕵️. \
     Use /register to join.\n";

pub const NOT_ENOUGH_PARTICIPANTS: &str =
    "Sorry, at least 2 people are needed to run the assignment 😔\n";

pub const ALREADY_ASSIGNED: &str = "The assignment has already been made!\n\
     Use /assign_me to find out who you are giving a gift to.\n";

pub const ASSIGNMENT_DONE: &str =
    "Congratulations! The Secret Santa assignment has just been drawn! 🎁🎁\n";

pub const NOT_ASSIGNED: &str = "It looks like nobody was assigned to you. \
     Had you filled in all the required details?\n";

pub fn registration_status(open: bool) -> &'static str {
    if open {
        "Participants can now register and edit their details for the Secret Santa.\n"
    } else {
        "Registration and edits for the Secret Santa are now closed.\n"
    }
}

pub fn registered(info: &str) -> String {
    format!(
        "Congratulations! You have been added to the Secret Santa participants 🎁.\n\
         This is what we know about you:\n{info}\
         If you want to leave, use /delete_me.\n"
    )
}

pub fn already_registered(info: &str) -> String {
    format!(
        "It looks like you are already registered!\n\
         This is what we know about you:\n{info}\
         If you want to leave, use /delete_me.\n"
    )
}

pub fn unregistered() -> String {
    "You have been removed from the Secret Santa participants 😢.\n".to_string()
}

pub fn address_updated(info: &str) -> String {
    format!("Your address has been updated.\nThis is what we know about you:\n{info}")
}

pub fn message_updated(info: &str) -> String {
    format!("Your message to your Secret Santa has been updated.\nThis is what we know about you:\n{info}")
}

pub const fn input_prompt(mode: InputMode) -> &'static str {
    match mode {
        InputMode::AwaitingAddress => "Ok! Send me your address.\n",
        InputMode::AwaitingMessage => "Ok! Send me the message you want to leave for your Secret Santa.\n",
        InputMode::None => "Ok!\n",
    }
}

pub fn participant_list(ids: &[ParticipantId]) -> String {
    if ids.is_empty() {
        return "Be the first to register for the Secret Santa! 🎁🎁\n".to_string();
    }
    ids.iter().map(|id| format!("- @{id}\n")).collect()
}

/// A participant's own details, with hints about what is missing
pub fn own_info(participant: Option<&Participant>) -> String {
    let Some(p) = participant else {
        return "You are not registered for the Secret Santa.\n".to_string();
    };

    let mut out = format!("👤: {}\n", p.id);
    if p.has_message() {
        out.push_str(&format!("📬: {}\n", p.message));
    } else {
        out.push_str("You can leave a message for your Secret Santa with /add_message\n");
    }
    if p.has_address() {
        out.push_str(&format!("🏠: {}\n", p.address));
        out.push_str(
            "Make sure the address is correct and includes your full name.\n\
             You can change it with /modify_address\n",
        );
    } else {
        out.push_str(
            "Remember: to take part you need to provide an address that includes your full name.\n\
             Add it with /add_address\n\
             It will only be shared with your Secret Santa!\n",
        );
    }
    out
}

/// The assigned child's details as shown to their santa
pub fn child_profile(child: &Participant) -> String {
    let mut out = format!(
        "These are the details of the person assigned to you!\n👤: {}\n🏠: {}\n",
        child.id, child.address
    );
    if child.has_message() {
        out.push_str(&format!("📬: {}\n", child.message));
    }
    out.push_str("\nThey are a very special person, good luck!\n");
    out
}

pub fn inconsistent_child(child: &ParticipantId) -> String {
    format!(
        "Oops! Something went wrong: @{child} was assigned to you but has no address on file. \
         This should not have happened, please contact an organiser.\n"
    )
}

/// Reply for `/assign_me` before the draw
pub fn waiting(participant: Option<&Participant>, assignment_date: Option<&str>) -> String {
    let patience = assignment_date.map_or_else(
        || "Hang on a little longer, the draw has not happened yet.\n".to_string(),
        |date| format!("Hang on a little longer, the draw should happen on {date}.\n"),
    );

    let mut out = "It looks like the assignment has not been drawn yet!\n".to_string();
    match participant {
        None => out.push_str("There is still time to join, use /register!\n"),
        Some(p) if !p.has_address() => {
            out.push_str("Remember to add your address!\nThis is what we know about you:\n");
            out.push_str(&own_info(Some(p)));
            out.push_str(&patience);
        }
        Some(_) => out.push_str(&patience),
    }
    out
}

pub fn incomplete_report(report: &MissingAddressReport) -> String {
    let mut out = format!(
        "{}/{} participants have provided their address.\n",
        report.eligible, report.total
    );
    if report.eligible < 2 {
        out.push_str("That is not enough to run the assignment.\n");
    }
    if !report.missing.is_empty() {
        let names: Vec<String> = report.missing.iter().map(|id| format!("@{id}")).collect();
        out.push_str(&format!(
            "{} {} not provided an address yet.\n",
            names.join(", "),
            if names.len() == 1 { "has" } else { "have" }
        ));
    }
    out
}

pub fn excluded(ids: &[ParticipantId]) -> String {
    let names: Vec<&str> = ids.iter().map(ParticipantId::as_str).collect();
    format!(
        "{} {} excluded because no address was provided.\n",
        names.join(", "),
        if names.len() == 1 { "was" } else { "were" }
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(name: &str) -> ParticipantId {
        ParticipantId::parse(name).unwrap()
    }

    #[test]
    fn test_participant_list() {
        assert!(participant_list(&[]).contains("Be the first"));
        assert_eq!(participant_list(&[id("amy"), id("ben")]), "- @amy\n- @ben\n");
    }

    #[test]
    fn test_incomplete_report_pluralises() {
        let report = MissingAddressReport {
            total: 3,
            eligible: 1,
            missing: vec![id("amy"), id("cat")],
        };
        let text = incomplete_report(&report);
        assert!(text.starts_with("1/3"));
        assert!(text.contains("not enough"));
        assert!(text.contains("@amy, @cat have"));
    }

    #[test]
    fn test_own_info_hints() {
        let mut p = Participant::new(id("amy"));
        assert!(own_info(Some(&p)).contains("/add_address"));
        p.address = "1 Snow Lane".to_string();
        let text = own_info(Some(&p));
        assert!(text.contains("🏠: 1 Snow Lane"));
        assert!(text.contains("/modify_address"));
    }

    #[test]
    fn test_child_profile_lines() {
        let mut child = Participant::new(id("ben"));
        child.address = "2 Ice Road".to_string();
        assert!(!child_profile(&child).contains("📬"));

        child.message = "no socks".to_string();
        let text = child_profile(&child);
        assert!(text.contains("👤: ben\n🏠: 2 Ice Road\n📬: no socks\n"));
    }

    #[test]
    fn test_incomplete_report_single_missing() {
        let report = MissingAddressReport {
            total: 3,
            eligible: 2,
            missing: vec![id("cat")],
        };
        let text = incomplete_report(&report);
        assert_eq!(
            text,
            "2/3 participants have provided their address.\n@cat has not provided an address yet.\n"
        );
    }
}
