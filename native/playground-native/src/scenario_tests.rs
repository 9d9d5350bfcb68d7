//! End-to-end runs through the coordinator with an in-memory surface.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::document::inspect;
    use crate::error::{NotFoundError, PlaygroundError};
    use crate::renderer::MemorySurface;
    use crate::store::FileStore;
    use crate::{EditorChange, PlaygroundConfig, RunCoordinator, RunOutcome};

    fn playground() -> RunCoordinator<MemorySurface> {
        RunCoordinator::new(PlaygroundConfig::default(), MemorySurface::new())
    }

    fn edit(c: &mut RunCoordinator<MemorySurface>, name: &str, text: &str) {
        c.handle_editor_change(EditorChange::new(name, Some(text.to_string())))
            .unwrap();
    }

    fn presented(c: &RunCoordinator<MemorySurface>) -> String {
        c.renderer()
            .surface()
            .content()
            .expect("nothing presented")
            .to_string()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Single-file run
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_single_file_renders() {
        let mut c = playground();
        c.load([(
            "App.tsx",
            "function App(){return <h1>Hi</h1>;} root.render(<App/>);",
        )]);

        assert_eq!(c.list_files(), vec!["App.tsx"]);
        assert_eq!(c.active_name(), Some("App.tsx"));

        let outcome = c.run().unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Rendered {
                file: "App.tsx".to_string()
            }
        );

        let html = presented(&c);
        let summary = inspect(&html).unwrap();
        let user_script = summary.inline_scripts.last().unwrap();
        assert!(user_script.contains("React.createElement"));
        assert!(user_script.contains("root.render"));
        assert_eq!(summary.count_id("root"), 1);
        assert!(!html.contains("color: red"));
        assert!(!html.contains("Failed to transform"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Broken edit
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_broken_edit_presents_diagnostic() {
        let mut c = playground();
        c.load([(
            "App.tsx",
            "function App(){return <h1>Hi</h1>;} root.render(<App/>);",
        )]);
        c.run().unwrap();

        edit(&mut c, "App.tsx", "function App(){ return <h1>Unterminated");
        let outcome = c.run().unwrap();

        let diagnostic = match outcome {
            RunOutcome::Failed { file, diagnostic } => {
                assert_eq!(file, "App.tsx");
                diagnostic
            }
            other => panic!("expected failure, got {:?}", other),
        };
        assert!(!diagnostic.trim().is_empty());

        let html = presented(&c);
        let summary = inspect(&html).unwrap();
        assert!(html.contains("color: red"));
        assert!(!summary.has_scripts());
        assert_eq!(summary.count_id("root"), 0);
        assert!(summary.text.contains("Failed to transform App.tsx"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Select and run
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_select_and_run_reads_selected_file() {
        let mut c = playground();
        c.load([
            ("A.tsx", "root.render(<p>from A</p>);"),
            ("B.tsx", "root.render(<p>from B</p>);"),
        ]);

        let outcome = c.select_and_run("B.tsx").unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Rendered {
                file: "B.tsx".to_string()
            }
        );
        assert_eq!(c.active_name(), Some("B.tsx"));

        let html = presented(&c);
        assert!(html.contains("from B"));
        assert!(!html.contains("from A"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Unknown file
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_set_active_missing_file() {
        let mut store = FileStore::from_files([("App.tsx", "1;")]);
        let err = store.set_active("Missing.tsx").unwrap_err();
        assert_eq!(err, NotFoundError::new("Missing.tsx"));
        assert_eq!(store.active_name(), Some("App.tsx"));

        let mut c = playground();
        c.load([("App.tsx", "1;")]);
        assert!(matches!(
            c.select_and_run("Missing.tsx"),
            Err(PlaygroundError::NotFound(_))
        ));
        assert_eq!(c.active_name(), Some("App.tsx"));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Authored files with imports and exports
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_authored_component_file() {
        let mut c = playground();
        c.load([(
            "HelloWorld.tsx",
            "import React from 'react';\n\n\
             interface HelloWorldProps {\n  name?: string;\n}\n\n\
             const HelloWorld: React.FC<HelloWorldProps> = ({ name = 'World' }) => {\n  \
             return <h2>Hello, {name}!</h2>;\n};\n\n\
             export default HelloWorld;\n\
             root.render(<HelloWorld />);",
        )]);

        assert!(matches!(c.run().unwrap(), RunOutcome::Rendered { .. }));
        let html = presented(&c);
        assert!(!html.contains("HelloWorldProps"));
        assert!(!html.contains("import React"));
    }

    #[test]
    fn test_files_share_names_without_collision() {
        let mut c = playground();
        c.load([
            ("A.tsx", "const root2 = 1; function App() { return null; }"),
            ("B.tsx", "const root2 = 2; function App() { return null; }"),
        ]);
        let a = c.run().unwrap();
        let b = c.select_and_run("B.tsx").unwrap();
        assert!(matches!(a, RunOutcome::Rendered { .. }));
        assert!(matches!(b, RunOutcome::Rendered { .. }));
        assert!(presented(&c).contains("(() => {"));
    }

    #[test]
    fn test_recovery_after_fix() {
        let mut c = playground();
        c.load([("App.tsx", "root.render(<p>ok</p>")]);
        assert!(matches!(c.run().unwrap(), RunOutcome::Failed { .. }));

        edit(&mut c, "App.tsx", "root.render(<p>ok</p>);");
        assert!(matches!(c.run().unwrap(), RunOutcome::Rendered { .. }));
        assert!(!presented(&c).contains("color: red;"));
    }
}
