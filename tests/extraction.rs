//! End-to-end extraction and editing through the public API.
//!
//! Multi-project layouts are written to a temporary directory so parent
//! build scripts and settings are found on disk the way the CLI finds them.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use buildmodel::parser::context::ParseContext;
use buildmodel::parser::resolver::VariableResolver;
use buildmodel::parser::walker::register_script;
use buildmodel::{
    find_group, remove_entity, BuildFileParser, BuildModelConfig, Entity, EntityGroup, EntityKind,
    Metadata, Project, DEPENDENCIES_GROUP, REPOSITORIES_GROUP, VERSIONS_GROUP,
};
use buildmodel_dsl::parse_script;

// ============================================================================
// Test Infrastructure
// ============================================================================

const ROOT_BUILD: &str = "\
buildscript {
    ext.pluginVersion = '2.3.3'
    repositories {
        jcenter()
    }
    dependencies {
        classpath \"com.android.tools.build:gradle:$pluginVersion\"
    }
}

allprojects {
    repositories {
        mavenCentral()
        maven {
            url 'https://repo.example.com/maven'
        }
    }
}
";

const APP_BUILD: &str = "\
android {
    compileSdkVersion 24
    buildToolsVersion '25.0.3'
}

dependencies {
    compile 'com.google.code.gson:gson:2.8.0'
    testCompile 'junit:junit:4.12'
}
";

/// Write `files` under a fresh temporary directory.
fn layout(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, text) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    dir
}

fn multi_project() -> TempDir {
    layout(&[
        ("settings.gradle", "include ':app'\n"),
        ("build.gradle", ROOT_BUILD),
        ("app/build.gradle", APP_BUILD),
    ])
}

fn extract(root: &Path, file: &str) -> (Project, Vec<EntityGroup>) {
    let mut project = Project::new(root);
    let id = project.open(file).unwrap();
    let groups = BuildFileParser::new(BuildModelConfig::default()).parse(id, &mut project);
    (project, groups)
}

fn entity<'a>(groups: &'a [EntityGroup], group: &str, name: &str) -> &'a Entity {
    find_group(groups, group)
        .unwrap_or_else(|| panic!("no group {}", group))
        .entities
        .iter()
        .find(|e| e.display_name == name)
        .unwrap_or_else(|| panic!("no entity {} in {}", name, group))
}

fn binding_texts(project: &Project, entity: &Entity) -> Vec<String> {
    entity
        .bindings
        .iter()
        .filter_map(|b| project.binding_text(*b))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Variable Resolution
// ============================================================================

mod resolution {
    use super::*;

    #[test]
    fn mutual_references_resolve_to_empty_value() {
        let source = "a = b\nb = a\n";
        let mut project = Project::new("/work");
        let id = project.add_document("build.gradle", source);
        let mut ctx = ParseContext::new(id);
        register_script(&mut ctx, &parse_script(source), source);

        let resolver = VariableResolver::new(&ctx);
        for assignment in ctx.assignments() {
            let resolution = resolver.resolve_assignment(assignment);
            assert_eq!(resolution.value, "");
        }
    }

    #[test]
    fn plugin_version_through_variable() {
        let source = "\
v = \"3.0.0\"
buildscript {
    dependencies {
        classpath \"com.android.tools.build:gradle:$v\"
    }
}
";
        let mut project = Project::new("/work");
        let id = project.add_document("build.gradle", source);
        let groups = BuildFileParser::new(BuildModelConfig::default()).parse(id, &mut project);

        let plugin = entity(&groups, VERSIONS_GROUP, "Plugin Version");
        assert_eq!(plugin.current_value, "3.0.0");
        assert_eq!(binding_texts(&project, plugin), vec!["3.0.0"]);
        let (_, span) = project.navigate(plugin.bindings[0]).unwrap();
        assert_eq!(span.start, source.find("3.0.0").unwrap());
        assert!(!plugin.has(Metadata::Removable));
    }

    #[test]
    fn numeric_sdk_version_binds_its_token() {
        let source = "android {\n    compileSdkVersion 24\n}\n";
        let mut project = Project::new("/work");
        let id = project.add_document("build.gradle", source);
        let groups = BuildFileParser::new(BuildModelConfig::default()).parse(id, &mut project);

        let sdk = entity(&groups, VERSIONS_GROUP, "Compile SDK Version");
        assert_eq!(sdk.current_value, "24");
        assert_eq!(binding_texts(&project, sdk), vec!["24"]);
        assert_eq!(
            project.binding_text(sdk.whole_range.unwrap()),
            Some("compileSdkVersion 24")
        );
    }
}

// ============================================================================
// Coordinates
// ============================================================================

mod coordinates {
    use super::*;

    #[test]
    fn dimensions_round_trip() {
        let dir = layout(&[("build.gradle", APP_BUILD)]);
        let (project, groups) = extract(dir.path(), "build.gradle");

        let gson = entity(&groups, DEPENDENCIES_GROUP, "com.google.code.gson:gson");
        let EntityKind::Dependency(dependency) = &gson.kind else {
            panic!("expected a dependency");
        };
        let texts: Vec<&str> = [&dependency.group, &dependency.artifact, &dependency.version]
            .iter()
            .map(|d| project.binding_text(d.bindings[0]).unwrap())
            .collect();
        assert_eq!(texts.join(":"), "com.google.code.gson:gson:2.8.0");
        assert_eq!(gson.current_value, "com.google.code.gson:gson:2.8.0");
        assert_eq!(dependency.configuration, "compile");
    }

    #[test]
    fn every_configuration_is_listed() {
        let dir = layout(&[("build.gradle", APP_BUILD)]);
        let (_, groups) = extract(dir.path(), "build.gradle");
        let names: Vec<&str> = find_group(&groups, DEPENDENCIES_GROUP)
            .unwrap()
            .entities
            .iter()
            .map(|e| e.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["com.google.code.gson:gson", "junit:junit"]);
    }
}

// ============================================================================
// Multi-project Builds
// ============================================================================

mod multi_project {
    use super::*;

    #[test]
    fn child_sees_allprojects_but_not_buildscript_repositories() {
        let dir = multi_project();
        let (_, groups) = extract(dir.path(), "app/build.gradle");

        let repos = find_group(&groups, REPOSITORIES_GROUP).unwrap();
        let names: Vec<&str> = repos.entities.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["Maven Central", "https://repo.example.com/maven"]);
        assert!(repos.entities.iter().all(|e| e.has(Metadata::Injected)));
        assert!(!names.contains(&"JCenter"));
    }

    #[test]
    fn root_sees_its_own_repositories_as_outgoing() {
        let dir = multi_project();
        let (_, groups) = extract(dir.path(), "build.gradle");

        let jcenter = entity(&groups, REPOSITORIES_GROUP, "JCenter");
        assert!(jcenter.has(Metadata::ReadOnly));
        assert!(!jcenter.has(Metadata::Outgoing));
        let central = entity(&groups, REPOSITORIES_GROUP, "Maven Central");
        assert!(central.has(Metadata::Outgoing));
        assert!(!central.has(Metadata::Injected));
    }

    #[test]
    fn child_resolves_parent_plugin_version() {
        let dir = multi_project();
        let (project, groups) = extract(dir.path(), "app/build.gradle");

        let plugin = entity(&groups, VERSIONS_GROUP, "Plugin Version");
        assert_eq!(plugin.current_value, "2.3.3");
        assert!(plugin.has(Metadata::Injected));
        let (path, _) = project.navigate(plugin.bindings[0]).unwrap();
        assert_eq!(path, dir.path().join("build.gradle"));
    }

    #[test]
    fn undeclared_directory_is_a_standalone_project() {
        let dir = layout(&[
            ("settings.gradle", "include ':lib'\n"),
            ("build.gradle", ROOT_BUILD),
            ("app/build.gradle", APP_BUILD),
        ]);
        let (_, groups) = extract(dir.path(), "app/build.gradle");
        assert!(find_group(&groups, REPOSITORIES_GROUP).is_none());
        assert!(entity(&groups, VERSIONS_GROUP, "Compile SDK Version")
            .metadata
            .contains(&Metadata::Removable));
    }

    #[test]
    fn unreadable_settings_leave_the_script_standalone() {
        let dir = layout(&[("build.gradle", ROOT_BUILD), ("app/build.gradle", APP_BUILD)]);
        fs::write(dir.path().join("settings.gradle"), [0xff, 0xfe]).unwrap();

        let (_, groups) = extract(dir.path(), "app/build.gradle");
        assert!(find_group(&groups, REPOSITORIES_GROUP).is_none());
        assert!(find_group(&groups, DEPENDENCIES_GROUP).is_some());
        assert_eq!(
            entity(&groups, VERSIONS_GROUP, "Compile SDK Version").current_value,
            "24"
        );
    }

    #[test]
    fn custom_file_names_from_config() {
        let dir = layout(&[
            ("settings.gradle.kts", "include ':app'\n"),
            ("build.gradle", ROOT_BUILD),
            ("app/build.gradle", APP_BUILD),
        ]);
        let config = BuildModelConfig {
            settings_file: "settings.gradle.kts".to_string(),
            ..BuildModelConfig::default()
        };
        let mut project = Project::new(dir.path());
        let id = project.open("app/build.gradle").unwrap();
        let groups = BuildFileParser::new(config).parse(id, &mut project);
        assert!(find_group(&groups, REPOSITORIES_GROUP).is_some());
    }
}

// ============================================================================
// Removal
// ============================================================================

mod removal {
    use super::*;

    #[test]
    fn removing_dependency_takes_one_line() {
        let dir = multi_project();
        let (mut project, groups) = extract(dir.path(), "app/build.gradle");

        let gson = entity(&groups, DEPENDENCIES_GROUP, "com.google.code.gson:gson");
        remove_entity(&mut project, gson).unwrap();
        let saved = project.save_modified().unwrap();
        assert_eq!(saved, vec![dir.path().join("app/build.gradle")]);

        let text = fs::read_to_string(dir.path().join("app/build.gradle")).unwrap();
        assert_eq!(text, APP_BUILD.replace("    compile 'com.google.code.gson:gson:2.8.0'\n", ""));
    }

    #[test]
    fn other_bindings_survive_a_removal() {
        let dir = multi_project();
        let (mut project, groups) = extract(dir.path(), "app/build.gradle");

        let sdk = entity(&groups, VERSIONS_GROUP, "Compile SDK Version");
        let junit = entity(&groups, DEPENDENCIES_GROUP, "junit:junit");
        remove_entity(&mut project, sdk).unwrap();
        assert_eq!(binding_texts(&project, junit), vec!["junit", "junit", "4.12"]);
        remove_entity(&mut project, junit).unwrap();

        let id = project.find("app/build.gradle").unwrap();
        assert_eq!(
            project.document(id).unwrap().text(),
            "\
android {
    buildToolsVersion '25.0.3'
}

dependencies {
    compile 'com.google.code.gson:gson:2.8.0'
}
"
        );
    }

    #[test]
    fn sibling_arguments_are_removed_one_at_a_time() {
        let source = "dependencies {\n    compile 'a:b:1', 'c:d:2'\n}\n";
        let mut project = Project::new("/work");
        let id = project.add_document("build.gradle", source);
        let groups = BuildFileParser::new(BuildModelConfig::default()).parse(id, &mut project);

        let first = entity(&groups, DEPENDENCIES_GROUP, "a:b");
        let second = entity(&groups, DEPENDENCIES_GROUP, "c:d");
        remove_entity(&mut project, first).unwrap();
        assert_eq!(
            project.document(id).unwrap().text(),
            "dependencies {\n    compile 'c:d:2'\n}\n"
        );
        assert_eq!(binding_texts(&project, second), vec!["c", "d", "2"]);

        remove_entity(&mut project, second).unwrap();
        assert_eq!(project.document(id).unwrap().text(), "dependencies {\n}\n");
    }

    #[test]
    fn removing_injected_repository_edits_parent() {
        let dir = multi_project();
        let (mut project, groups) = extract(dir.path(), "app/build.gradle");

        let maven = entity(&groups, REPOSITORIES_GROUP, "https://repo.example.com/maven");
        remove_entity(&mut project, maven).unwrap();
        let root = project.find("build.gradle").unwrap();
        let text = project.document(root).unwrap().text();
        assert!(!text.contains("maven {"));
        assert!(text.contains("        mavenCentral()\n    }\n}\n"));
    }
}
