/// Instruction template sent to the model for every ticket.
///
/// Contains the category/priority enums, the eta-by-priority mapping and five
/// few-shot examples. The only placeholder is [`TICKET_PLACEHOLDER`].
pub const CLASSIFY_TEMPLATE: &str = include_str!("../../prompts/classify_ticket.txt");

pub const TICKET_PLACEHOLDER: &str = "{ticket}";

pub fn build_prompt(ticket: &str) -> String {
    CLASSIFY_TEMPLATE.replacen(TICKET_PLACEHOLDER, ticket, 1)
}
