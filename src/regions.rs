//! App Store region catalog
//!
//! A compiled-in, closed catalog of storefront regions with English and
//! Chinese display names. The catalog is built once, indexed by code, and
//! never mutated afterwards.
//!
//! # Example
//!
//! ```rust
//! use appstore_switcher::{region_label, region_options, Language};
//!
//! assert_eq!(region_label("JP ", Language::En), "Japan (JP)");
//! assert_eq!(region_label("zz", Language::En), "ZZ");
//!
//! let options = region_options(Language::En);
//! assert_eq!(options[0].code, "us");
//! ```

use crate::error::{Error, Result};
use crate::types::{Language, RegionCode, RegionOption};
use glob::Pattern;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// A single storefront region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    /// Lowercase two-letter storefront code
    pub code: &'static str,
    pub english: &'static str,
    pub chinese: &'static str,
    /// Space-separated toneless pinyin of `chinese`, used for collation
    pub pinyin: &'static str,
}

impl RegionInfo {
    /// Localized "Name (CODE)" label
    pub fn label(&self, language: Language) -> String {
        let name = match language {
            Language::En => self.english,
            Language::Zh => self.chinese,
        };
        format!("{} ({})", name, self.code.to_ascii_uppercase())
    }

    fn collation_key(&self, language: Language) -> String {
        match language {
            Language::En => self.english.to_lowercase(),
            Language::Zh => self.pinyin.to_string(),
        }
    }
}

/// Regions used when the stored favorites are missing or end up empty
pub const DEFAULT_FAVORITE_REGIONS: &[&str] = &["us", "cn", "jp", "de"];

/// Regions pinned to the top of every option list, in this order
pub const PRIORITY_REGIONS: &[&str] = &["us", "cn", "hk", "tw", "jp", "kr", "gb", "de"];

const fn region(
    code: &'static str,
    english: &'static str,
    chinese: &'static str,
    pinyin: &'static str,
) -> RegionInfo {
    RegionInfo {
        code,
        english,
        chinese,
        pinyin,
    }
}

/// Storefront data, ordered by code
pub const REGION_DATA: &[RegionInfo] = &[
    region("ae", "United Arab Emirates", "阿联酋", "a lian qiu"),
    region("ag", "Antigua and Barbuda", "安提瓜和巴布达", "an ti gua he ba bu da"),
    region("ai", "Anguilla", "安圭拉", "an gui la"),
    region("al", "Albania", "阿尔巴尼亚", "a er ba ni ya"),
    region("am", "Armenia", "亚美尼亚", "ya mei ni ya"),
    region("ao", "Angola", "安哥拉", "an ge la"),
    region("ar", "Argentina", "阿根廷", "a gen ting"),
    region("at", "Austria", "奥地利", "ao di li"),
    region("au", "Australia", "澳大利亚", "ao da li ya"),
    region("az", "Azerbaijan", "阿塞拜疆", "a sai bai jiang"),
    region("bb", "Barbados", "巴巴多斯", "ba ba duo si"),
    region("be", "Belgium", "比利时", "bi li shi"),
    region("bf", "Burkina Faso", "布基纳法索", "bu ji na fa suo"),
    region("bg", "Bulgaria", "保加利亚", "bao jia li ya"),
    region("bh", "Bahrain", "巴林", "ba lin"),
    region("bj", "Benin", "贝宁", "bei ning"),
    region("bm", "Bermuda", "百慕大", "bai mu da"),
    region("bn", "Brunei", "文莱", "wen lai"),
    region("bo", "Bolivia", "玻利维亚", "bo li wei ya"),
    region("br", "Brazil", "巴西", "ba xi"),
    region("bs", "Bahamas", "巴哈马", "ba ha ma"),
    region("bt", "Bhutan", "不丹", "bu dan"),
    region("bw", "Botswana", "博茨瓦纳", "bo ci wa na"),
    region("by", "Belarus", "白俄罗斯", "bai e luo si"),
    region("bz", "Belize", "伯利兹", "bo li zi"),
    region("ca", "Canada", "加拿大", "jia na da"),
    region("cg", "Republic of the Congo", "刚果（布）", "gang guo bu"),
    region("ch", "Switzerland", "瑞士", "rui shi"),
    region("cl", "Chile", "智利", "zhi li"),
    region("cn", "China Mainland", "中国大陆", "zhong guo da lu"),
    region("co", "Colombia", "哥伦比亚", "ge lun bi ya"),
    region("cr", "Costa Rica", "哥斯达黎加", "ge si da li jia"),
    region("cv", "Cape Verde", "佛得角", "fo de jiao"),
    region("cy", "Cyprus", "塞浦路斯", "sai pu lu si"),
    region("cz", "Czechia", "捷克", "jie ke"),
    region("de", "Germany", "德国", "de guo"),
    region("dk", "Denmark", "丹麦", "dan mai"),
    region("dm", "Dominica", "多米尼克", "duo mi ni ke"),
    region("do", "Dominican Republic", "多米尼加共和国", "duo mi ni jia gong he guo"),
    region("dz", "Algeria", "阿尔及利亚", "a er ji li ya"),
    region("ec", "Ecuador", "厄瓜多尔", "e gua duo er"),
    region("ee", "Estonia", "爱沙尼亚", "ai sha ni ya"),
    region("eg", "Egypt", "埃及", "ai ji"),
    region("es", "Spain", "西班牙", "xi ban ya"),
    region("fi", "Finland", "芬兰", "fen lan"),
    region("fj", "Fiji", "斐济", "fei ji"),
    region("fm", "Micronesia", "密克罗尼西亚", "mi ke luo ni xi ya"),
    region("fr", "France", "法国", "fa guo"),
    region("gb", "United Kingdom", "英国", "ying guo"),
    region("gd", "Grenada", "格林纳达", "ge lin na da"),
    region("gh", "Ghana", "加纳", "jia na"),
    region("gm", "Gambia", "冈比亚", "gang bi ya"),
    region("gr", "Greece", "希腊", "xi la"),
    region("gt", "Guatemala", "危地马拉", "wei di ma la"),
    region("gw", "Guinea-Bissau", "几内亚比绍", "ji nei ya bi shao"),
    region("gy", "Guyana", "圭亚那", "gui ya na"),
    region("hk", "Hong Kong", "中国香港", "zhong guo xiang gang"),
    region("hn", "Honduras", "洪都拉斯", "hong du la si"),
    region("hr", "Croatia", "克罗地亚", "ke luo di ya"),
    region("hu", "Hungary", "匈牙利", "xiong ya li"),
    region("id", "Indonesia", "印度尼西亚", "yin du ni xi ya"),
    region("ie", "Ireland", "爱尔兰", "ai er lan"),
    region("il", "Israel", "以色列", "yi se lie"),
    region("in", "India", "印度", "yin du"),
    region("is", "Iceland", "冰岛", "bing dao"),
    region("it", "Italy", "意大利", "yi da li"),
    region("jm", "Jamaica", "牙买加", "ya mai jia"),
    region("jo", "Jordan", "约旦", "yue dan"),
    region("jp", "Japan", "日本", "ri ben"),
    region("ke", "Kenya", "肯尼亚", "ken ni ya"),
    region("kg", "Kyrgyzstan", "吉尔吉斯斯坦", "ji er ji si si tan"),
    region("kh", "Cambodia", "柬埔寨", "jian pu zhai"),
    region("kn", "Saint Kitts and Nevis", "圣基茨和尼维斯", "sheng ji ci he ni wei si"),
    region("kr", "South Korea", "韩国", "han guo"),
    region("kw", "Kuwait", "科威特", "ke wei te"),
    region("ky", "Cayman Islands", "开曼群岛", "kai man qun dao"),
    region("kz", "Kazakhstan", "哈萨克斯坦", "ha sa ke si tan"),
    region("la", "Laos", "老挝", "lao wo"),
    region("lb", "Lebanon", "黎巴嫩", "li ba nen"),
    region("lc", "Saint Lucia", "圣卢西亚", "sheng lu xi ya"),
    region("lk", "Sri Lanka", "斯里兰卡", "si li lan ka"),
    region("lr", "Liberia", "利比里亚", "li bi li ya"),
    region("lt", "Lithuania", "立陶宛", "li tao wan"),
    region("lu", "Luxembourg", "卢森堡", "lu sen bao"),
    region("lv", "Latvia", "拉脱维亚", "la tuo wei ya"),
    region("md", "Moldova", "摩尔多瓦", "mo er duo wa"),
    region("mg", "Madagascar", "马达加斯加", "ma da jia si jia"),
    region("mk", "North Macedonia", "北马其顿", "bei ma qi dun"),
    region("ml", "Mali", "马里", "ma li"),
    region("mn", "Mongolia", "蒙古", "meng gu"),
    region("mo", "Macao", "中国澳门", "zhong guo ao men"),
    region("mr", "Mauritania", "毛里塔尼亚", "mao li ta ni ya"),
    region("ms", "Montserrat", "蒙特塞拉特", "meng te sai la te"),
    region("mt", "Malta", "马耳他", "ma er ta"),
    region("mu", "Mauritius", "毛里求斯", "mao li qiu si"),
    region("mw", "Malawi", "马拉维", "ma la wei"),
    region("mx", "Mexico", "墨西哥", "mo xi ge"),
    region("my", "Malaysia", "马来西亚", "ma lai xi ya"),
    region("mz", "Mozambique", "莫桑比克", "mo sang bi ke"),
    region("na", "Namibia", "纳米比亚", "na mi bi ya"),
    region("ne", "Niger", "尼日尔", "ni ri er"),
    region("ng", "Nigeria", "尼日利亚", "ni ri li ya"),
    region("ni", "Nicaragua", "尼加拉瓜", "ni jia la gua"),
    region("nl", "Netherlands", "荷兰", "he lan"),
    region("no", "Norway", "挪威", "nuo wei"),
    region("np", "Nepal", "尼泊尔", "ni bo er"),
    region("nz", "New Zealand", "新西兰", "xin xi lan"),
    region("om", "Oman", "阿曼", "a man"),
    region("pa", "Panama", "巴拿马", "ba na ma"),
    region("pe", "Peru", "秘鲁", "bi lu"),
    region("pg", "Papua New Guinea", "巴布亚新几内亚", "ba bu ya xin ji nei ya"),
    region("ph", "Philippines", "菲律宾", "fei lv bin"),
    region("pk", "Pakistan", "巴基斯坦", "ba ji si tan"),
    region("pl", "Poland", "波兰", "bo lan"),
    region("pt", "Portugal", "葡萄牙", "pu tao ya"),
    region("pw", "Palau", "帕劳", "pa lao"),
    region("py", "Paraguay", "巴拉圭", "ba la gui"),
    region("qa", "Qatar", "卡塔尔", "ka ta er"),
    region("ro", "Romania", "罗马尼亚", "luo ma ni ya"),
    region("ru", "Russia", "俄罗斯", "e luo si"),
    region("sa", "Saudi Arabia", "沙特阿拉伯", "sha te a la bo"),
    region("sb", "Solomon Islands", "所罗门群岛", "suo luo men qun dao"),
    region("sc", "Seychelles", "塞舌尔", "sai she er"),
    region("se", "Sweden", "瑞典", "rui dian"),
    region("sg", "Singapore", "新加坡", "xin jia po"),
    region("si", "Slovenia", "斯洛文尼亚", "si luo wen ni ya"),
    region("sk", "Slovakia", "斯洛伐克", "si luo fa ke"),
    region("sl", "Sierra Leone", "塞拉利昂", "sai la li ang"),
    region("sn", "Senegal", "塞内加尔", "sai nei jia er"),
    region("sr", "Suriname", "苏里南", "su li nan"),
    region("st", "Sao Tome and Principe", "圣多美和普林西比", "sheng duo mei he pu lin xi bi"),
    region("sv", "El Salvador", "萨尔瓦多", "sa er wa duo"),
    region("sz", "Eswatini", "斯威士兰", "si wei shi lan"),
    region("tc", "Turks and Caicos Islands", "特克斯和凯科斯群岛", "te ke si he kai ke si qun dao"),
    region("td", "Chad", "乍得", "zha de"),
    region("th", "Thailand", "泰国", "tai guo"),
    region("tj", "Tajikistan", "塔吉克斯坦", "ta ji ke si tan"),
    region("tm", "Turkmenistan", "土库曼斯坦", "tu ku man si tan"),
    region("tn", "Tunisia", "突尼斯", "tu ni si"),
    region("tr", "Turkey", "土耳其", "tu er qi"),
    region("tt", "Trinidad and Tobago", "特立尼达和多巴哥", "te li ni da he duo ba ge"),
    region("tw", "Taiwan", "中国台湾", "zhong guo tai wan"),
    region("tz", "Tanzania", "坦桑尼亚", "tan sang ni ya"),
    region("ua", "Ukraine", "乌克兰", "wu ke lan"),
    region("ug", "Uganda", "乌干达", "wu gan da"),
    region("us", "United States", "美国", "mei guo"),
    region("uy", "Uruguay", "乌拉圭", "wu la gui"),
    region("uz", "Uzbekistan", "乌兹别克斯坦", "wu zi bie ke si tan"),
    region("vc", "Saint Vincent and the Grenadines", "圣文森特和格林纳丁斯", "sheng wen sen te he ge lin na ding si"),
    region("ve", "Venezuela", "委内瑞拉", "wei nei rui la"),
    region("vg", "British Virgin Islands", "英属维尔京群岛", "ying shu wei er jing qun dao"),
    region("vn", "Vietnam", "越南", "yue nan"),
    region("ye", "Yemen", "也门", "ye men"),
    region("za", "South Africa", "南非", "nan fei"),
    region("zw", "Zimbabwe", "津巴布韦", "jin ba bu wei"),
];

/// Indexed view over [`REGION_DATA`]
///
/// Thread-safe via `OnceLock`; use [`RegionCatalog::global`].
#[derive(Debug)]
pub struct RegionCatalog {
    entries: &'static [RegionInfo],
    index: HashMap<&'static str, usize>,
    priority: &'static [&'static str],
}

impl RegionCatalog {
    /// The process-wide catalog
    pub fn global() -> &'static RegionCatalog {
        static INSTANCE: OnceLock<RegionCatalog> = OnceLock::new();
        INSTANCE.get_or_init(|| RegionCatalog::new(REGION_DATA, PRIORITY_REGIONS))
    }

    fn new(entries: &'static [RegionInfo], priority: &'static [&'static str]) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, info)| (info.code, i))
            .collect();
        Self {
            entries,
            index,
            priority,
        }
    }

    /// Look up a region; `code` is normalized first
    pub fn get(&self, code: &str) -> Option<&'static RegionInfo> {
        let code = normalize_region(code);
        self.index.get(code.as_str()).map(|&i| &self.entries[i])
    }

    pub fn is_valid(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Localized label for a known code, or the uppercased raw code
    pub fn label_for(&self, code: &str, language: Language) -> String {
        match self.get(code) {
            Some(info) => info.label(language),
            None => code.trim().to_uppercase(),
        }
    }

    pub fn all_codes(&self) -> Vec<RegionCode> {
        self.entries.iter().map(|info| info.code.to_string()).collect()
    }

    /// All regions as display options
    ///
    /// Priority regions come first in their configured order; the rest are
    /// sorted by localized label (pinyin for Chinese), ties broken by code.
    pub fn options_for(&self, language: Language) -> Vec<RegionOption> {
        let mut pinned: Vec<&RegionInfo> = self
            .priority
            .iter()
            .filter_map(|code| self.get(code))
            .collect();

        let mut rest: Vec<(&RegionInfo, String)> = self
            .entries
            .iter()
            .filter(|info| !self.priority.contains(&info.code))
            .map(|info| (info, info.collation_key(language)))
            .collect();
        rest.sort_by(|(a, ka), (b, kb)| match ka.cmp(kb) {
            Ordering::Equal => a.code.cmp(b.code),
            other => other,
        });

        pinned.extend(rest.into_iter().map(|(info, _)| info));
        pinned
            .into_iter()
            .map(|info| RegionOption {
                code: info.code.to_string(),
                label: info.label(language),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trim and case-fold a region code
pub fn normalize_region(code: &str) -> RegionCode {
    code.trim().to_lowercase()
}

pub fn is_valid_region(code: &str) -> bool {
    RegionCatalog::global().is_valid(code)
}

pub fn region_label(code: &str, language: Language) -> String {
    RegionCatalog::global().label_for(code, language)
}

pub fn all_region_codes() -> Vec<RegionCode> {
    RegionCatalog::global().all_codes()
}

pub fn region_options(language: Language) -> Vec<RegionOption> {
    RegionCatalog::global().options_for(language)
}

/// Normalize codes, drop unknown ones and duplicates (first occurrence wins)
pub fn filter_valid_regions<I, S>(codes: I) -> Vec<RegionCode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .map(|code| normalize_region(code.as_ref()))
        .filter(|code| is_valid_region(code) && seen.insert(code.clone()))
        .collect()
}

/// Filter options by a search box query (case-insensitive substring on code
/// or label); an empty query keeps everything
pub fn search_options(options: &[RegionOption], query: &str) -> Vec<RegionOption> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return options.to_vec();
    }
    options
        .iter()
        .filter(|option| {
            option.code.contains(&needle) || option.label.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Query region codes by glob patterns (OR logic)
///
/// Returns the codes in catalog order.
pub fn query_regions(patterns: &[&str]) -> Result<Vec<RegionCode>> {
    // Compile all patterns first to fail fast on invalid patterns
    let compiled: Vec<Pattern> = patterns
        .iter()
        .map(|p| {
            Pattern::new(&p.trim().to_lowercase())
                .map_err(|e| Error::InvalidGlobPattern(format!("'{}': {}", p, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(REGION_DATA
        .iter()
        .filter(|info| compiled.iter().any(|pattern| pattern.matches(info.code)))
        .map(|info| info.code.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_duplicate_codes() {
        let mut seen = HashSet::new();
        for info in REGION_DATA {
            assert!(seen.insert(info.code), "duplicate code {}", info.code);
            assert_eq!(info.code, info.code.to_ascii_lowercase());
            assert_eq!(info.code.len(), 2);
        }
    }

    #[test]
    fn test_defaults_and_priority_are_catalog_codes() {
        for code in DEFAULT_FAVORITE_REGIONS.iter().chain(PRIORITY_REGIONS) {
            assert!(is_valid_region(code), "{} missing from catalog", code);
        }
    }

    #[test]
    fn test_label_for_known_and_unknown() {
        assert_eq!(region_label("us", Language::En), "United States (US)");
        assert_eq!(region_label(" JP", Language::Zh), "日本 (JP)");
        assert_eq!(region_label(" xx ", Language::En), "XX");
    }

    #[test]
    fn test_is_valid_normalizes() {
        assert!(is_valid_region(" US "));
        assert!(!is_valid_region("zz"));
        assert!(!is_valid_region(""));
    }

    #[test]
    fn test_options_pin_priority_first() {
        let options = region_options(Language::En);
        let head: Vec<&str> = options
            .iter()
            .take(PRIORITY_REGIONS.len())
            .map(|o| o.code.as_str())
            .collect();
        assert_eq!(head, PRIORITY_REGIONS);
        assert_eq!(options.len(), REGION_DATA.len());
    }

    #[test]
    fn test_options_rest_sorted_by_english_label() {
        let options = region_options(Language::En);
        let rest = &options[PRIORITY_REGIONS.len()..];
        assert_eq!(rest[0].code, "al"); // Albania
        for pair in rest.windows(2) {
            assert!(pair[0].label.to_lowercase() <= pair[1].label.to_lowercase());
        }
    }

    #[test]
    fn test_options_rest_sorted_by_pinyin_for_chinese() {
        let options = region_options(Language::Zh);
        let rest = &options[PRIORITY_REGIONS.len()..];
        // 阿尔巴尼亚 (a er ...) sorts before 阿尔及利亚 (a er ji ...)
        let al = rest.iter().position(|o| o.code == "al").unwrap();
        let dz = rest.iter().position(|o| o.code == "dz").unwrap();
        assert!(al < dz);
        assert_eq!(rest.last().unwrap().code, "mo"); // 中国澳门 zhong guo ao men
    }

    #[test]
    fn test_options_are_stable() {
        assert_eq!(region_options(Language::Zh), region_options(Language::Zh));
    }

    #[test]
    fn test_filter_valid_regions_dedupes_and_drops_unknown() {
        let filtered = filter_valid_regions(["US", "zz", " us", "jp", ""]);
        assert_eq!(filtered, vec!["us".to_string(), "jp".to_string()]);
    }

    #[test]
    fn test_search_options_matches_code_or_label() {
        let options = region_options(Language::En);
        let found = search_options(&options, "japan");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "jp");

        let by_code = search_options(&options, "JP");
        assert!(by_code.iter().any(|o| o.code == "jp"));

        assert_eq!(search_options(&options, "  ").len(), options.len());
    }

    #[test]
    fn test_query_regions_glob() {
        let codes = query_regions(&["u*"]).unwrap();
        assert_eq!(codes, vec!["ua", "ug", "us", "uy", "uz"]);
    }

    #[test]
    fn test_query_regions_invalid_pattern() {
        assert!(query_regions(&["[invalid"]).is_err());
    }
}
