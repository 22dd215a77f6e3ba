use angular_view_compiler::selector::{CssSelector, SelectorMatcher};

#[cfg(test)]
mod tests {
    use super::*;

    // Element selector for a concrete element, the way templates build them
    fn element(tag: &str, attrs: &[(&str, &str)]) -> CssSelector {
        let attrs: Vec<(String, String)> = attrs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        CssSelector::create_element_css_selector(tag, &attrs)
    }

    fn matcher_for(selectors: &[(&str, i32)]) -> SelectorMatcher<i32> {
        let mut matcher = SelectorMatcher::new();
        for (selector, context) in selectors {
            matcher.add_selectables(&CssSelector::parse(selector).unwrap(), *context);
        }
        matcher
    }

    fn matches(matcher: &SelectorMatcher<i32>, css_selector: &CssSelector) -> Vec<i32> {
        let mut matched = Vec::new();
        matcher.match_selector(css_selector, |_, context| matched.push(*context));
        matched.sort();
        matched
    }

    #[test]
    fn should_select_by_element_name_case_sensitive() {
        let matcher = matcher_for(&[("someTag", 1)]);
        assert!(matches(&matcher, &element("SOMEOTHERTAG", &[])).is_empty());
        assert!(matches(&matcher, &element("SOMETAG", &[])).is_empty());
        assert_eq!(matches(&matcher, &element("someTag", &[])), vec![1]);
    }

    #[test]
    fn should_select_by_class_name_case_insensitive() {
        let matcher = matcher_for(&[(".someClass", 1), (".someClass.class2", 2)]);
        assert!(matches(&matcher, &element("div", &[("class", "SOMEOTHERCLASS")])).is_empty());
        assert_eq!(matches(&matcher, &element("div", &[("class", "SOMECLASS")])), vec![1]);
        assert_eq!(
            matches(&matcher, &element("div", &[("class", "someClass class2")])),
            vec![1, 2]
        );
    }

    #[test]
    fn should_select_by_attr_name_case_sensitive_independent_of_value() {
        let matcher = matcher_for(&[("[someAttr]", 1), ("[someAttr][someAttr2]", 2)]);
        assert!(matches(&matcher, &element("div", &[("SOMEOTHERATTR", "")])).is_empty());
        assert!(matches(&matcher, &element("div", &[("SOMEATTR", "")])).is_empty());
        assert_eq!(matches(&matcher, &element("div", &[("someAttr", "someValue")])), vec![1]);
        assert_eq!(
            matches(&matcher, &element("div", &[("someAttr", ""), ("someAttr2", "")])),
            vec![1, 2]
        );
    }

    #[test]
    fn should_select_by_attr_value_case_insensitive() {
        let matcher = matcher_for(&[("[someAttr=someValue]", 1)]);
        assert!(matches(&matcher, &element("div", &[("someAttr", "SOMEOTHERATTR")])).is_empty());
        assert_eq!(matches(&matcher, &element("div", &[("someAttr", "SOMEVALUE")])), vec![1]);
    }

    #[test]
    fn should_select_by_element_class_and_attribute_together() {
        let matcher = matcher_for(&[("someTag.someClass[someAttr=someValue]", 1)]);
        assert!(matches(&matcher, &element("someTag", &[("class", "someClass")])).is_empty());
        assert_eq!(
            matches(
                &matcher,
                &element("someTag", &[("class", "someClass"), ("someAttr", "someValue")])
            ),
            vec![1]
        );
    }

    #[test]
    fn should_not_select_with_matching_not_selector() {
        let matcher = matcher_for(&[("p:not(.someClass)", 1), (":not([someAttr])", 2)]);
        assert!(matches(&matcher, &element("p", &[("class", "someClass"), ("someAttr", "")])).is_empty());
        assert_eq!(matches(&matcher, &element("p", &[("someAttr", "")])), vec![1]);
        assert_eq!(matches(&matcher, &element("div", &[])), vec![2]);
    }

    #[test]
    fn should_not_select_twice_with_two_matches_in_list() {
        let matcher = matcher_for(&[("input, .someClass", 1)]);
        assert_eq!(matches(&matcher, &element("input", &[("class", "someclass")])), vec![1]);
        // The list is reset between lookups.
        assert_eq!(matches(&matcher, &element("span", &[("class", "someclass")])), vec![1]);
    }

    #[test]
    fn should_report_whether_anything_matched() {
        let matcher = matcher_for(&[("a", 1)]);
        assert!(matcher.match_selector(&element("a", &[]), |_, _| {}));
        assert!(!matcher.match_selector(&element("b", &[]), |_, _| {}));
    }

    #[test]
    fn should_detect_lists_of_selectors() {
        let selectors = CssSelector::parse(".someclass,[attrname=attrvalue], sometag").unwrap();
        let rendered: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
        assert_eq!(rendered, vec![".someclass", "[attrname=attrvalue]", "sometag"]);
    }
}
