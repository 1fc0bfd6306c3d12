use chrono::{TimeZone, Utc};
use fortytwo_widgets::profile::Skill;
use fortytwo_widgets::render::{ProjectsOptions, SkillsOptions, StudentOptions, WidgetKind, WidgetOptions};
use fortytwo_widgets::{
    StudentProfile, Theme, compute_stats, container_height, generate_projects, generate_skills,
    generate_student_profile, parse_profile, render_widget,
};
use fortytwo_widgets::normalize::StatsOptions;

fn fixture(name: &str) -> StudentProfile {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_profile(&input).expect("fixture parse failed")
}

const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];

fn assert_well_formed(svg: &str, label: &str) {
    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""), "{label}: bad root");
    assert!(svg.ends_with("</svg>"), "{label}: unterminated");
    assert!(!svg.contains("<?xml"), "{label}: has a declaration");
    let groups = svg.matches("<g ").count() + svg.matches("<g>").count();
    assert_eq!(groups, svg.matches("</g>").count(), "{label}: unbalanced <g>");
    assert_eq!(
        svg.matches("<text").count(),
        svg.matches("</text>").count(),
        "{label}: unbalanced <text>"
    );
    assert_eq!(
        svg.matches("<tspan").count(),
        svg.matches("</tspan>").count(),
        "{label}: unbalanced <tspan>"
    );
    for (index, _) in svg.match_indices('&') {
        let rest = &svg[index..];
        assert!(
            ENTITIES.iter().any(|entity| rest.starts_with(entity)),
            "{label}: bare ampersand at {index}"
        );
    }
}

fn root_height(svg: &str) -> u32 {
    let start = svg.find("height=\"").expect("root height") + "height=\"".len();
    let end = start + svg[start..].find('"').expect("closing quote");
    svg[start..end].parse().expect("numeric height")
}

fn as_of() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 3, 8, 12, 0).unwrap()
}

#[test]
fn every_widget_is_well_formed_for_every_fixture() {
    let fixtures = ["jdoe.json", "piscine_only.json", "alt_cursus.json", "empty.json", "exported.json"];
    let kinds = [WidgetKind::Skills, WidgetKind::Projects, WidgetKind::Student, WidgetKind::Badge];
    for name in fixtures {
        let profile = fixture(name);
        for theme in [Theme::dark(), Theme::light()] {
            for kind in kinds {
                let svg = render_widget(kind, &profile, &theme, &WidgetOptions::default());
                assert_well_formed(&svg, &format!("{name}/{kind}/{}", theme.name));
            }
        }
    }
}

#[test]
fn rendering_is_deterministic() {
    let profile = fixture("jdoe.json");
    let options = WidgetOptions {
        as_of: Some(as_of()),
        footer_note: Some("updated Oct 3, 2024".to_string()),
        ..WidgetOptions::default()
    };
    for kind in [WidgetKind::Skills, WidgetKind::Projects, WidgetKind::Student, WidgetKind::Badge] {
        let first = render_widget(kind, &profile, &Theme::dark(), &options);
        let second = render_widget(kind, &profile, &Theme::dark(), &options);
        assert_eq!(first, second, "{kind} output drifted");
    }
}

#[test]
fn projects_widget_and_statistics_agree_on_completion() {
    let profile = fixture("jdoe.json");
    for include_piscine in [false, true] {
        let stats = compute_stats(
            &profile,
            &StatsOptions {
                include_piscine,
                ..StatsOptions::default()
            },
        );
        let svg = generate_projects(
            &profile,
            "dark",
            &ProjectsOptions {
                include_piscine,
                ..ProjectsOptions::default()
            },
        );
        assert!(
            svg.contains(&format!("# {} completed", stats.completed_count)),
            "piscine={include_piscine}"
        );
        assert_eq!(svg.matches("/100</tspan>").count(), stats.completed_count);
    }
}

#[test]
fn one_more_skill_adds_exactly_one_row() {
    let build = |count: usize| {
        let mut profile = StudentProfile::new("grow");
        profile.skills.insert(
            "42cursus".to_string(),
            (0..count).map(|i| Skill::new(format!("skill {i}"), i as f64 / 2.0)).collect(),
        );
        profile
    };
    let options = SkillsOptions::default();
    let mut previous = root_height(&generate_skills(&build(1), "dark", &options));
    for count in 2..8 {
        let height = root_height(&generate_skills(&build(count), "dark", &options));
        assert_eq!(height, previous + 30, "{count} skills");
        previous = height;
    }
}

#[test]
fn piscine_projects_are_excluded_by_default() {
    let profile = fixture("jdoe.json");
    let svg = generate_projects(&profile, "dark", &ProjectsOptions::default());
    assert!(!svg.contains("Shell00"));
    assert!(!svg.contains("/* C Piscine */"));
    let svg = generate_projects(
        &profile,
        "dark",
        &ProjectsOptions {
            include_piscine: true,
            ..ProjectsOptions::default()
        },
    );
    assert!(svg.contains(">Shell00</tspan>"));
    assert!(svg.contains("/* C Piscine */"));
    assert!(!svg.contains("Rush00"));

    let pisciner = fixture("piscine_only.json");
    let svg = generate_projects(&pisciner, "dark", &ProjectsOptions::default());
    assert!(svg.contains("error: No completed projects found"));
    let svg = generate_projects(
        &pisciner,
        "dark",
        &ProjectsOptions {
            include_piscine: true,
            ..ProjectsOptions::default()
        },
    );
    assert!(svg.contains(">Shell00</tspan>"));
    assert!(svg.contains(">C00</tspan>"));
    assert!(svg.contains("# 2 completed"));
}

#[test]
fn level_falls_back_to_the_highest_cursus() {
    let profile = fixture("alt_cursus.json");
    let stats = compute_stats(&profile, &StatsOptions::default());
    assert_eq!(stats.level, 7.3);
    let svg = generate_student_profile(&profile, "dark", &StudentOptions::default());
    assert!(svg.contains(">Alt Ernate</tspan>"));
    assert!(svg.contains(">7.30</tspan>"));
    assert!(svg.contains(">N/A</tspan>"));
}

#[test]
fn empty_skills_render_the_error_panel() {
    let profile = fixture("empty.json");
    let svg = generate_skills(&profile, "dark", &SkillsOptions::default());
    assert!(svg.contains("width=\"500\" height=\"200\""));
    assert!(svg.contains("error: No skills data available</text>"));
    assert!(svg.contains(">ls -la skills --by-cursus</tspan>"));
}

#[test]
fn single_skill_renders_one_group_and_one_row() {
    let mut profile = StudentProfile::new("x");
    profile.skills.insert("42cursus".to_string(), vec![Skill::new("C", 9.45)]);
    let svg = generate_skills(&profile, "dark", &SkillsOptions::default());
    assert_well_formed(&svg, "single skill");
    assert!(svg.contains(">C</tspan>"));
    assert!(svg.contains(">9.45</tspan>"));
    assert_eq!(svg.matches("/* 42cursus */").count(), 1);
    assert!(svg.contains("1 skills in 1 cursus"));
}

#[test]
fn skills_table_groups_piscine_first() {
    let profile = fixture("jdoe.json");
    let svg = generate_skills(&profile, "dark", &SkillsOptions::default());
    let piscine = svg.find("/* C Piscine */").expect("piscine group");
    let cursus = svg.find("/* 42cursus */").expect("cursus group");
    assert!(piscine < cursus);
    assert!(svg.contains(">jdoe@42: ~/skills</text>"));
    assert!(svg.contains(">Algorithms &amp; AI</tspan>"));
    assert!(svg.contains(">11.03</tspan>"));
    assert!(svg.contains("5 skills in 2 cursus"));
    assert_eq!(root_height(&svg), 40 + 68 + 40 + 7 * 30 + 40);
    assert_eq!(container_height(WidgetKind::Skills, &profile), 325);
}

#[test]
fn marks_are_colored_by_tier() {
    let profile = fixture("jdoe.json");
    let dark = Theme::dark();
    let svg = generate_projects(&profile, "dark", &ProjectsOptions::default());
    assert!(svg.contains(&format!("fill=\"{}\" font-weight=\"bold\">125/100", dark.success)));
    assert!(svg.contains(&format!("fill=\"{}\" font-weight=\"bold\">80/100", dark.warning)));
    assert!(svg.contains(">[TEAM:3]</tspan>"));
    assert!(svg.contains("# 4 completed · 2 team · 2 solo · best 125/100"));
    let newest = svg.find(">ft_irc<").expect("ft_irc row");
    let oldest = svg.find(">Libft<").expect("Libft row");
    assert!(newest < oldest);
}

#[test]
fn user_text_is_escaped_everywhere() {
    let profile = fixture("exported.json");
    let skills = generate_skills(&profile, "dark", &SkillsOptions::default());
    assert!(skills.contains(">Tom &amp; Jerry&apos;s &lt;C&gt;</tspan>"));
    assert!(skills.contains(">cats &gt; mice</tspan>"));
    assert!(skills.contains(">DESCRIPTION</tspan>"));

    let projects = generate_projects(&profile, "light", &ProjectsOptions::default());
    assert!(projects.contains(">a&lt;b&gt;&amp;c</tspan>"));
    assert!(projects.contains(">Mar 5, 2024</tspan>"));

    let student = generate_student_profile(&profile, "dark", &StudentOptions::default());
    assert!(student.contains(">Zoé &lt;Ünïcødé&gt; &amp; &quot;Co&quot;</tspan>"));
    assert!(!student.contains("<Ünïcødé>"));
}

#[test]
fn student_card_shows_statistics_and_coalition() {
    let profile = fixture("jdoe.json");
    let svg = generate_student_profile(
        &profile,
        "dark",
        &StudentOptions {
            as_of: Some(as_of()),
            ..StudentOptions::default()
        },
    );
    assert!(svg.contains(">10.42</tspan>"));
    assert!(svg.contains(">101.5/100</tspan>"));
    assert!(svg.contains(">125/100</tspan>"));
    assert!(svg.contains(">7.66</tspan>"));
    assert!(svg.contains(">Oct 3, 2022</tspan>"));
    assert!(svg.contains(">731 days</tspan>"));
    assert!(svg.contains(">250 ₳</tspan>"));
    assert!(svg.contains("fill=\"#FFCD42\""));
    assert!(svg.contains(">The Federation</tspan>"));
    assert!(svg.contains(">1234</tspan>"));
    assert_eq!(root_height(&svg), 636);
}

#[test]
fn oversized_widths_render_the_error_panel() {
    let profile = fixture("jdoe.json");
    let skills = generate_skills(
        &profile,
        "dark",
        &SkillsOptions {
            width: 60_000_000,
            ..SkillsOptions::default()
        },
    );
    assert!(skills.contains("error: width must be at most 4000</text>"));
    let projects = generate_projects(
        &profile,
        "dark",
        &ProjectsOptions {
            width: u32::MAX,
            ..ProjectsOptions::default()
        },
    );
    assert!(projects.contains("error: width must be at most 4000</text>"));
    let student = generate_student_profile(
        &profile,
        "dark",
        &StudentOptions {
            width: 4001,
            ..StudentOptions::default()
        },
    );
    assert!(student.contains("error: width must be at most 4000</text>"));
    let widest = generate_skills(
        &profile,
        "dark",
        &SkillsOptions {
            width: 4000,
            ..SkillsOptions::default()
        },
    );
    assert!(widest.contains("width=\"4000\""));
}
