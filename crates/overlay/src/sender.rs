use chatplus_routing::{HandlerResult, RoutingEvent};

pub const SENDER_HANDLER_NAME: &str = "sender-detection";
const MAX_PLAYER_NAME_LEN: usize = 16;

/// Extracts the player name from a `<name> text` chat line.
pub fn detect_sender(content: &str) -> Option<&str> {
    let rest = content.trim_start().strip_prefix('<')?;
    let (name, _) = rest.split_once('>')?;
    let valid = !name.is_empty()
        && name.len() <= MAX_PLAYER_NAME_LEN
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    valid.then_some(name)
}

/// Routing handler that fills in the message sender when none is set yet.
pub fn sender_handler() -> impl FnMut(&mut RoutingEvent) -> HandlerResult + Send + 'static {
    |event: &mut RoutingEvent| {
        if event.message().sender.is_some() {
            return Ok(());
        }
        let sender = detect_sender(event.message().raw_content()).map(str::to_string);
        event.message_mut().sender = sender;
        Ok(())
    }
}
