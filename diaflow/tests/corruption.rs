use diaflow::xml::{Element, read_document};
use diaflow::{Block, Case, Comp, ErrorKind, MAX_DEPTH, ParseError, Program, WriteOptions};

fn parse_err(source: &str) -> ParseError {
    Program::from_xml(source).expect_err("document should be rejected")
}

fn sample() -> Program {
    let mut program = Program::new();
    let f = program.function("f");
    f.params = vec!["a".to_string()];
    f.body.push(Block::if_else(
        "a",
        Comp::from(vec![Block::while_loop(
            "w",
            Comp::from(vec![Block::switch(
                "s",
                vec![Case::new("1", Comp::from(vec![Block::output("o")]))],
            )]),
        )]),
        Comp::from(vec![
            Block::for_loop("i", "c", "n", Comp::from(vec![Block::input("in")])),
            Block::foreach("v", "it", Comp::from(vec![Block::assign("x")])),
            Block::do_while("d", Comp::from(vec![Block::comment("c")])),
        ]),
    ));
    f.body.push(Block::call("g", "r", ["p"]));
    f.body.push(Block::ret("a"));
    program.function("g");
    program
}

/// Paths (child indices from the root) to every element carrying attributes.
fn attributed_paths(element: &Element, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    if !element.attributes.is_empty() {
        out.push(path.clone());
    }
    for (i, child) in element.children.iter().enumerate() {
        path.push(i);
        attributed_paths(child, path, out);
        path.pop();
    }
}

fn element_at<'a>(root: &'a mut Element, path: &[usize]) -> &'a mut Element {
    path.iter().fold(root, |el, &i| &mut el.children[i])
}

#[test]
fn removing_any_attribute_corrupts_the_document() {
    let root = sample().to_element();
    let mut paths = Vec::new();
    attributed_paths(&root, &mut Vec::new(), &mut paths);

    let mut checked = 0;
    for path in &paths {
        let keys: Vec<String> = element_at(&mut root.clone(), path)
            .attributes
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            let mut damaged = root.clone();
            let target = element_at(&mut damaged, path);
            target.attributes.retain(|(k, _)| *k != key);
            let name = target.name.clone();

            let text = damaged.write_to(&WriteOptions::default());
            let result = Program::from_xml(&text);
            match &result {
                Err(error) => assert_eq!(
                    error.kind,
                    ErrorKind::MissingAttribute {
                        element: name.clone(),
                        attribute: match key.as_str() {
                            "expr" => "expr",
                            "cond" => "cond",
                            "init" => "init",
                            "inc" => "inc",
                            "var" => "var",
                            "iter" => "iter",
                            "name" => "name",
                            "retvar" => "retvar",
                            "comment" => "comment",
                            other => panic!("unexpected attribute {other}"),
                        },
                    },
                    "removing `{key}` from <{name}>"
                ),
                Ok(_) => panic!("removing `{key}` from <{name}> was accepted"),
            }
            assert!(result.unwrap_or_default().is_empty());
            checked += 1;
        }
    }
    assert!(checked >= 20, "only {checked} attributes exercised");
}

#[test]
fn missing_root() {
    assert_eq!(parse_err("").kind, ErrorKind::MissingRoot);
    assert_eq!(parse_err("<program/>").kind, ErrorKind::MissingRoot);
    assert_eq!(parse_err("<comp><func name=\"f\"/></comp>").kind, ErrorKind::MissingRoot);
}

#[test]
fn missing_required_children() {
    let err = parse_err(r#"<prog><func name="f"><arg name="a"/></func></prog>"#);
    assert_eq!(
        err.kind,
        ErrorKind::MissingChild {
            element: "func".into(),
            child: "body"
        }
    );

    let err = parse_err(r#"<prog><func name="f"><body><if cond="c"><then/></if></body></func></prog>"#);
    assert_eq!(
        err.kind,
        ErrorKind::MissingChild {
            element: "if".into(),
            child: "else"
        }
    );

    let err = parse_err(r#"<prog><func name="f"><body><if cond="c"><else/></if></body></func></prog>"#);
    assert_eq!(
        err.kind,
        ErrorKind::MissingChild {
            element: "if".into(),
            child: "then"
        }
    );
}

#[test]
fn unknown_tags_anywhere() {
    let cases = [
        (r#"<prog><function name="f"/></prog>"#, "function", "prog"),
        (r#"<prog><func name="f"><body/><extra/></func></prog>"#, "extra", "func"),
        (r#"<prog><func name="f"><body><goto/></body></func></prog>"#, "goto", "body"),
        (
            r#"<prog><func name="f"><body><while cond="c"><loop/></while></body></func></prog>"#,
            "loop",
            "while",
        ),
        (
            r#"<prog><func name="f"><body><switch expr="s"><default/></switch></body></func></prog>"#,
            "default",
            "switch",
        ),
        (
            r#"<prog><func name="f"><body><call name="g" retvar=""><param expr="1"/></call></body></func></prog>"#,
            "param",
            "call",
        ),
        (
            r#"<prog><func name="f"><body><if cond="c"><then/><else/><elif/></if></body></func></prog>"#,
            "elif",
            "if",
        ),
        (
            r#"<prog><func name="f"><body><break><x/></break></body></func></prog>"#,
            "x",
            "break",
        ),
        (r#"<prog><func name="f"><body><comp/></body></func></prog>"#, "comp", "body"),
    ];
    for (source, tag, parent) in cases {
        assert_eq!(
            parse_err(source).kind,
            ErrorKind::UnknownTag {
                tag: tag.into(),
                parent: parent.into()
            },
            "{source}"
        );
    }
}

#[test]
fn duplicates_are_rejected() {
    let err = parse_err(r#"<prog><func name="f"><body/><body/></func></prog>"#);
    assert_eq!(
        err.kind,
        ErrorKind::DuplicateChild {
            element: "func".into(),
            child: "body"
        }
    );

    let err = parse_err(
        r#"<prog><func name="f"><body><if cond="c"><then/><then/><else/></if></body></func></prog>"#,
    );
    assert_eq!(
        err.kind,
        ErrorKind::DuplicateChild {
            element: "if".into(),
            child: "then"
        }
    );

    let err = parse_err(r#"<prog><func name="f"><body/></func><func name="f"><body/></func></prog>"#);
    assert_eq!(err.kind, ErrorKind::DuplicateFunction("f".into()));
}

#[test]
fn deep_failure_discards_completed_functions() {
    // "a" decodes completely before "b" fails four levels down.
    let source = r#"<prog>
        <func name="a"><body><assign expr="x = 1"/></body></func>
        <func name="b"><body>
            <while cond="1"><for init="" cond="" inc=""><if cond="c">
                <then><assign expr="y"/><in/></then><else/>
            </if></for></while>
        </body></func>
    </prog>"#;
    let result = Program::from_xml(source);
    let err = result.clone().unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingAttribute {
            element: "in".into(),
            attribute: "expr"
        }
    );
    assert_eq!(&source[err.span.clone()], "<in/>");
    assert!(result.unwrap_or_default().is_empty());
}

#[test]
fn valid_empty_is_distinct_from_corrupt() {
    assert!(Program::from_xml("<prog/>").unwrap().is_empty());
    assert!(Program::from_xml("<prog").is_err());
    assert!(matches!(
        parse_err("<prog><func name=\"f\">").kind,
        ErrorKind::Malformed(_)
    ));
}

#[test]
fn spans_point_at_the_offending_tag() {
    let source = "<prog>\n  <func name=\"f\">\n    <body>\n      <while/>\n    </body>\n  </func>\n</prog>";
    let err = parse_err(source);
    assert_eq!(&source[err.span.clone()], "<while/>");
    assert_eq!(err.file_id, 0);

    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.labels.len(), 1);
    assert!(diagnostic.message.contains("missing required attribute `cond`"));
}

#[test]
fn element_tree_reader_is_public() {
    let root = read_document("<prog><func name=\"m\"><body/></func></prog>", 3).unwrap();
    assert_eq!(root.first_child("func").and_then(|f| f.attribute("name")), Some("m"));
    assert_eq!(root.children_named("func").count(), 1);
}

/// `<prog>`, `<func>` and `<body>` around `levels` nested while loops.
fn nested_whiles(levels: usize) -> String {
    let mut text = String::from("<prog><func name=\"f\"><body>");
    text += &"<while cond=\"a\">".repeat(levels - 1);
    text += "<while cond=\"a\"/>";
    text += &"</while>".repeat(levels - 1);
    text += "</body></func></prog>";
    text
}

#[test]
fn runaway_nesting_is_corruption_not_a_crash() {
    for levels in [200, 1_000, 100_000] {
        let source = nested_whiles(levels);
        let err = parse_err(&source);
        assert_eq!(err.kind, ErrorKind::TooDeep(MAX_DEPTH), "{levels} levels");
        assert_eq!(&source[err.span.clone()], "<while cond=\"a\">");
        // The first loop is level 4; the rejected one is level MAX_DEPTH + 1.
        let first = source.find("<while").unwrap();
        let width = "<while cond=\"a\">".len();
        assert_eq!(err.span.start, first + width * (MAX_DEPTH - 3));
    }
}

#[test]
fn nesting_up_to_the_limit_is_accepted() {
    // Three levels go to <prog>, <func> and <body>.
    let levels = MAX_DEPTH - 3;
    let program = Program::from_xml(&nested_whiles(levels)).unwrap();

    let mut depth = 0;
    let mut body = &program.get("f").unwrap().body;
    while let Some(Block::While { body: inner, .. }) = body.first() {
        depth += 1;
        body = inner;
    }
    assert_eq!(depth, levels);
    assert_eq!(Program::from_xml(&program.to_xml_string()).unwrap(), program);

    let err = parse_err(&nested_whiles(levels + 1));
    assert_eq!(err.kind, ErrorKind::TooDeep(MAX_DEPTH));
}

#[test]
fn wrappers_count_toward_the_depth() {
    // Each <if> costs two levels: the statement and its <then>.
    let pairs = (MAX_DEPTH - 3) / 2 + 1;
    let mut text = String::from("<prog><func name=\"f\"><body>");
    text += &"<if cond=\"c\"><else/><then>".repeat(pairs);
    text += &"</then></if>".repeat(pairs);
    text += "</body></func></prog>";

    let err = parse_err(&text);
    assert_eq!(err.kind, ErrorKind::TooDeep(MAX_DEPTH));
}
