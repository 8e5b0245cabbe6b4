use std::collections::HashMap;

/// Normalizes team identifiers from every input table to one canonical
/// 3-letter scheme.
///
/// The caller supplies the alias map (e.g. ESPN's "NJ" -> "NJD"); full
/// franchise names ("New Jersey Devils") are recognised as a fallback so
/// hand-edited spreadsheets still join.
#[derive(Debug, Clone, Default)]
pub struct TeamCodes {
    aliases: HashMap<String, String>,
}

impl TeamCodes {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(k, v)| (k.trim().to_uppercase(), v.trim().to_uppercase()))
            .collect();
        Self { aliases }
    }

    /// Canonical code for `raw`. Unknown codes pass through upper-cased.
    pub fn normalize(&self, raw: &str) -> String {
        let upper = raw.trim().to_uppercase();
        if let Some(code) = self.aliases.get(&upper) {
            return code.clone();
        }
        if let Some(code) = nhl_team_code(&upper) {
            return code.to_string();
        }
        upper
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn nhl_team_code(name: &str) -> Option<&'static str> {
    match name {
        "ANAHEIM DUCKS" | "ANAHEIM" => Some("ANA"),
        "ARIZONA COYOTES" | "ARIZONA" => Some("ARI"),
        "BOSTON BRUINS" | "BOSTON" => Some("BOS"),
        "BUFFALO SABRES" | "BUFFALO" => Some("BUF"),
        "CALGARY FLAMES" | "CALGARY" => Some("CGY"),
        "CAROLINA HURRICANES" | "CAROLINA" => Some("CAR"),
        "CHICAGO BLACKHAWKS" | "CHICAGO" => Some("CHI"),
        "COLORADO AVALANCHE" | "COLORADO" => Some("COL"),
        "COLUMBUS BLUE JACKETS" | "COLUMBUS" => Some("CBJ"),
        "DALLAS STARS" | "DALLAS" => Some("DAL"),
        "DETROIT RED WINGS" | "DETROIT" => Some("DET"),
        "EDMONTON OILERS" | "EDMONTON" => Some("EDM"),
        "FLORIDA PANTHERS" | "FLORIDA" => Some("FLA"),
        "LOS ANGELES KINGS" | "LOS ANGELES" | "LA KINGS" => Some("LAK"),
        "MINNESOTA WILD" | "MINNESOTA" => Some("MIN"),
        "MONTREAL CANADIENS" | "MONTREAL" => Some("MTL"),
        "NASHVILLE PREDATORS" | "NASHVILLE" => Some("NSH"),
        "NEW JERSEY DEVILS" | "NEW JERSEY" => Some("NJD"),
        "NEW YORK ISLANDERS" | "NY ISLANDERS" => Some("NYI"),
        "NEW YORK RANGERS" | "NY RANGERS" => Some("NYR"),
        "OTTAWA SENATORS" | "OTTAWA" => Some("OTT"),
        "PHILADELPHIA FLYERS" | "PHILADELPHIA" => Some("PHI"),
        "PITTSBURGH PENGUINS" | "PITTSBURGH" => Some("PIT"),
        "SAN JOSE SHARKS" | "SAN JOSE" => Some("SJS"),
        "SEATTLE KRAKEN" | "SEATTLE" => Some("SEA"),
        "ST LOUIS BLUES" | "ST. LOUIS BLUES" | "ST LOUIS" | "ST. LOUIS" => Some("STL"),
        "TAMPA BAY LIGHTNING" | "TAMPA BAY" => Some("TBL"),
        "TORONTO MAPLE LEAFS" | "TORONTO" => Some("TOR"),
        "UTAH HOCKEY CLUB" | "UTAH MAMMOTH" | "UTAH" => Some("UTA"),
        "VANCOUVER CANUCKS" | "VANCOUVER" => Some("VAN"),
        "VEGAS GOLDEN KNIGHTS" | "VEGAS" => Some("VGK"),
        "WASHINGTON CAPITALS" | "WASHINGTON" => Some("WSH"),
        "WINNIPEG JETS" | "WINNIPEG" => Some("WPG"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn espn_codes() -> TeamCodes {
        TeamCodes::new(HashMap::from([
            ("NJ".to_string(), "NJD".to_string()),
            ("la".to_string(), "lak".to_string()),
        ]))
    }

    #[test]
    fn test_alias_maps_to_canonical() {
        let codes = espn_codes();
        assert_eq!(codes.normalize("NJ"), "NJD");
        assert_eq!(codes.normalize(" la "), "LAK");
    }

    #[test]
    fn test_unknown_code_passes_through_uppercased() {
        assert_eq!(espn_codes().normalize("tor"), "TOR");
    }

    #[test]
    fn test_full_name_fallback() {
        let codes = TeamCodes::default();
        assert_eq!(codes.normalize("Tampa Bay Lightning"), "TBL");
        assert_eq!(codes.normalize("St. Louis Blues"), "STL");
    }
}
