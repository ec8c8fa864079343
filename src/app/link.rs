/// Page the chat lives on
pub const CHAT_PAGE: &str = "chat.html";

/// Query parameter naming the conversation to open
pub const CONVERSATION_PARAM: &str = "conversa";

/// Link that opens the chat page on a conversation
pub fn chat_link(conversation: u64) -> String {
    format!("{CHAT_PAGE}?{CONVERSATION_PARAM}={conversation}")
}

/// Extracts the conversation id from a link's query string
pub fn conversation_from_link(link: &str) -> Option<u64> {
    let (_, query) = link.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == CONVERSATION_PARAM)
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn link_roundtrip() {
        assert_eq!(chat_link(12), "chat.html?conversa=12");
        assert_eq!(conversation_from_link(&chat_link(12)), Some(12));
    }

    #[test]
    fn parses_query_strings() {
        assert_eq!(conversation_from_link("chat.html?x=1&conversa=5#end"), Some(5));
        assert_eq!(conversation_from_link("/chat.html?conversa=abc"), None);
        assert_eq!(conversation_from_link("chat.html?conversas=5"), None);
        assert_eq!(conversation_from_link("chat.html"), None);
    }
}
