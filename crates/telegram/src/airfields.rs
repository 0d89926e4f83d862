/// Static airfield directory used to enrich reference-search replies.
/// Keys are matched as lowercase substrings of the query.
pub const AIRFIELDS: &[(&str, &str, &str)] = &[
    ("стригино", "Нижний Новгород", "Аэропорт Стригино"),
    ("чкаловский", "Москва", "Аэродром Чкаловский"),
    ("пулково", "Санкт-Петербург", "Аэропорт Пулково"),
    ("внуково", "Москва", "Аэропорт Внуково"),
    ("кольцово", "Екатеринбург", "Аэропорт Кольцово"),
];

/// City/airfield header for a search query, when the query names a known
/// airfield.
pub fn airfield_info(query: &str) -> Option<String> {
    let query = query.to_lowercase();
    AIRFIELDS.iter().find(|(key, _, _)| query.contains(key)).map(|(_, city, airfield)| {
        format!("🏙 <b>Город:</b> {city}\n✈️ <b>Аэродром:</b> {airfield}")
    })
}

#[cfg(test)]
mod tests {
    use super::airfield_info;

    #[test]
    fn known_airfields_are_resolved_case_insensitively() {
        let info = airfield_info("Аэродром ЧКАЛОВСКИЙ").expect("known airfield");
        assert!(info.contains("Москва"));
        assert!(info.contains("Чкаловский"));
    }

    #[test]
    fn unknown_queries_resolve_to_nothing() {
        assert!(airfield_info("шереметьево").is_none());
    }
}
