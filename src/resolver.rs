use url::Url;

/// Known recruiting domains mapped to display names. Checked in order;
/// no key here is a suffix of another at a label boundary, so order is
/// not load-bearing today — document any future entry that changes that.
const RECRUITMENT_DOMAINS: &[(&str, &str)] = &[
    ("tencent.com", "Tencent (腾讯)"),
    ("careers.tencent.com", "Tencent (腾讯)"),
    ("alibaba.com", "Alibaba (阿里巴巴)"),
    ("talent.alibaba.com", "Alibaba (阿里巴巴)"),
    ("bytedance.com", "ByteDance (字节跳动)"),
    ("jobs.bytedance.com", "ByteDance (字节跳动)"),
    ("huawei.com", "Huawei (华为)"),
    ("career.huawei.com", "Huawei (华为)"),
    ("google.com", "Google"),
    ("apple.com", "Apple"),
    ("amazon.jobs", "Amazon"),
    ("careers.microsoft.com", "Microsoft"),
    ("tesla.com", "Tesla"),
    ("jobs.meituan.com", "Meituan (美团)"),
    ("campus.kuaishou.cn", "Kuaishou (快手)"),
    ("jobs.58.com", "58.com (58同城)"),
    ("zhaopin.com", "Zhaopin (智联招聘)"),
    ("lagou.com", "Lagou (拉勾)"),
    ("bosszhipin.com", "Boss Zhipin (Boss直聘)"),
    ("linkedin.com", "LinkedIn (领英)"),
];

/// Labels too generic to be an organization name on their own.
const GENERIC_LABELS: &[&str] = &["com", "cn", "net", "org", "careers", "jobs", "talent"];

/// Best-guess organization name for a candidate URL string.
///
/// Accepts anything: bare hostnames, strings without a scheme, malformed
/// input. Never fails; `None` means no guess.
pub fn identify_company(url_text: &str) -> Option<String> {
    let trimmed = url_text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut clean = trimmed.to_lowercase();
    if !clean.starts_with("http") {
        clean = format!("https://{clean}");
    }

    let hostname = match Url::parse(&clean) {
        Ok(parsed) => parsed.host_str().map(str::to_string),
        Err(_) => None,
    };
    let Some(hostname) = hostname else {
        return containment_fallback(url_text);
    };

    for (domain, name) in RECRUITMENT_DOMAINS {
        if hostname == *domain || hostname.ends_with(&format!(".{domain}")) {
            return Some((*name).to_string());
        }
    }

    // No table hit: guess from the second-to-last hostname label, stepping
    // over generic tokens like "careers" or "jobs".
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    let main = labels[labels.len() - 2];
    let chosen = if GENERIC_LABELS.contains(&main) {
        if labels.len() >= 3 {
            labels[labels.len() - 3]
        } else {
            // A hostname that is only a generic token names nothing.
            return None;
        }
    } else {
        main
    };
    if chosen.is_empty() {
        return None;
    }
    Some(capitalize(chosen))
}

/// Last resort for input the URL parser rejects: look for the leading label
/// of any known domain anywhere in the text.
fn containment_fallback(url_text: &str) -> Option<String> {
    let lowered = url_text.to_lowercase();
    RECRUITMENT_DOMAINS
        .iter()
        .find(|(domain, _)| {
            let lead = domain.split('.').next().unwrap_or(domain);
            lowered.contains(lead)
        })
        .map(|(_, name)| (*name).to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
