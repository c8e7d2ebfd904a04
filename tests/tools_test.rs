mod common;

use assert2::{check, let_assert};
use common::{CACHE_INDEX, IsolatedWorkspace, isolated_workspace, loaded_workspace};
use rstest::rstest;
use sphinx_search::tools::index_info::{IndexInfoRequest, handle_index_info};
use sphinx_search::tools::load_index::{LoadIndexRequest, handle_load_index};
use sphinx_search::tools::lookup::{LookupObjectRequest, handle_lookup_object};
use sphinx_search::tools::search::{SearchRequest, handle_search};

fn search_request(query: &str, limit: Option<usize>) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        limit,
        as_you_type: false,
    }
}

// --- Before any index is loaded ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tools_require_loaded_index(isolated_workspace: IsolatedWorkspace) {
    let state = &isolated_workspace.state;

    let result = handle_search(state, search_request("execute", None)).await;
    let_assert!(Err(message) = &result);
    check!(message.contains("No index loaded"));

    let lookup = LookupObjectRequest {
        name: "execute".to_string(),
    };
    check!(handle_lookup_object(state, lookup).await.is_err());
    check!(handle_index_info(state, IndexInfoRequest::default()).await.is_err());
}

// --- load_index ---

/// Test: Loading by build directory finds searchindex.js inside it.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_accepts_build_directory(isolated_workspace: IsolatedWorkspace) {
    let request = LoadIndexRequest {
        path: isolated_workspace.html_dir().display().to_string(),
    };
    let output = handle_load_index(&isolated_workspace.state, request)
        .await
        .unwrap();

    check!(output.contains("31 documents"));
    check!(output.contains("301 objects"));
    check!(output.contains("envversion 50"));
    check!(output.contains("Source: parsed (snapshot cached)"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_failure_keeps_previous(loaded_workspace: IsolatedWorkspace) {
    let broken = loaded_workspace
        .workspace
        .create_file("broken/searchindex.js", "Search.setIndex({envversion:50");
    let request = LoadIndexRequest {
        path: broken.display().to_string(),
    };
    let result = handle_load_index(&loaded_workspace.state, request).await;
    let_assert!(Err(error) = result);
    check!(format!("{:#}", error).contains("malformed"));

    let active = loaded_workspace.state.index().await.unwrap();
    check!(active.path == loaded_workspace.index_path);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_reports_replacement(loaded_workspace: IsolatedWorkspace) {
    let other = loaded_workspace
        .workspace
        .create_file("other/searchindex.js", CACHE_INDEX);
    let request = LoadIndexRequest {
        path: other.display().to_string(),
    };
    let output = handle_load_index(&loaded_workspace.state, request)
        .await
        .unwrap();
    check!(output.contains("2 documents"));
    check!(output.contains("Replaced:"));

    // Responses computed against the old index are gone
    let result = handle_search(&loaded_workspace.state, search_request("cache", None))
        .await
        .unwrap();
    check!(result.contains("a.html"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_index_missing_path(isolated_workspace: IsolatedWorkspace) {
    let request = LoadIndexRequest {
        path: isolated_workspace.root().join("nope").display().to_string(),
    };
    let result = handle_load_index(&isolated_workspace.state, request).await;
    let_assert!(Err(error) = result);
    check!(error.to_string().contains("Failed to resolve path"));

    // A directory without an index
    let request = LoadIndexRequest {
        path: isolated_workspace.root().display().to_string(),
    };
    let result = handle_load_index(&isolated_workspace.state, request).await;
    let_assert!(Err(error) = result);
    check!(error.to_string().contains("No searchindex.js"));
}

// --- search ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_tool_renders_ranked_hits(loaded_workspace: IsolatedWorkspace) {
    let output = handle_search(&loaded_workspace.state, search_request("execute", Some(4)))
        .await
        .unwrap();

    check!(output.starts_with("Found 4 results for 'execute':"));
    check!(output.contains("1. System.System_Base.execute [suffix]"));
    check!(output.contains("Python method, in System"));
    check!(output.contains("in System > System.System_Base"));
    check!(output.contains("System.html#System.System_Base.execute"));
    check!(output.contains("4. DDM [term]"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_tool_no_results(loaded_workspace: IsolatedWorkspace) {
    let output = handle_search(&loaded_workspace.state, search_request("zzzzzz", None))
        .await
        .unwrap();
    check!(output == "No results found for 'zzzzzz'.\n");
}

/// Test: Repeated queries are answered identically (from the response cache).
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_tool_repeated_query(loaded_workspace: IsolatedWorkspace) {
    let first = handle_search(&loaded_workspace.state, search_request("learning", Some(5)))
        .await
        .unwrap();
    let second = handle_search(&loaded_workspace.state, search_request("learning", Some(5)))
        .await
        .unwrap();
    check!(first == second);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_tool_as_you_type(loaded_workspace: IsolatedWorkspace) {
    let request = SearchRequest {
        query: "diffu".to_string(),
        limit: None,
        as_you_type: true,
    };
    let output = handle_search(&loaded_workspace.state, request).await.unwrap();
    check!(output.starts_with("Found 3 results"));
}

/// Test: Concurrent searches either complete or report being superseded.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_tool_concurrent_calls(loaded_workspace: IsolatedWorkspace) {
    let state = loaded_workspace.state.clone();
    let queries = ["mec", "mech", "mecha", "mechan", "mechanism"];

    let handles: Vec<_> = queries
        .iter()
        .map(|query| {
            let state = state.clone();
            let request = SearchRequest {
                query: (*query).to_string(),
                limit: Some(10),
                as_you_type: true,
            };
            tokio::spawn(async move { handle_search(&state, request).await })
        })
        .collect();

    for handle in handles {
        let output = handle.await.unwrap().unwrap();
        check!(
            output.starts_with("Found")
                || output == sphinx_search::tools::search::SUPERSEDED_RESPONSE
        );
    }
}

// --- lookup_object and index_info ---

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_object_exact_and_suffix(loaded_workspace: IsolatedWorkspace) {
    let request = LookupObjectRequest {
        name: "run".to_string(),
    };
    let output = handle_lookup_object(&loaded_workspace.state, request)
        .await
        .unwrap();

    check!(!output.contains("Exact match:"));
    check!(output.contains("Objects ending in 'run' (5):"));
    check!(output.contains("Run (Python module)"));
    check!(output.contains("Run.html#module-Run"));
    check!(output.contains("Run.run (Python function)"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_object_rejects_empty_name(loaded_workspace: IsolatedWorkspace) {
    let request = LookupObjectRequest {
        name: "  ".to_string(),
    };
    check!(handle_lookup_object(&loaded_workspace.state, request).await.is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn index_info_summarizes(loaded_workspace: IsolatedWorkspace) {
    let output = handle_index_info(&loaded_workspace.state, IndexInfoRequest::default())
        .await
        .unwrap();
    check!(output.contains("Documents: 31"));
    check!(output.contains("Objects: 301"));
    check!(output.contains("py:method  Python method"));
}
